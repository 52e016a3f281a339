//! `mcnptools` is a small toolkit for static analysis of MCNP input decks
//!
#![doc = include_str!("../readme.md")]
#![deny(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

// Re-exports of toolkit crates.
#[doc(inline)]
pub use mcnptools_deck as deck;

#[doc(inline)]
pub use mcnptools_utils as utils;

#[cfg(feature = "check")]
#[cfg_attr(docsrs, doc(cfg(feature = "check")))]
#[doc(inline)]
pub use mcnptools_check as check;
