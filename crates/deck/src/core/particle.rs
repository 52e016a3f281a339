//! MCNP particle designators

// external crates
use serde::Serialize;

/// Complete collection of MCNP particle variants
///
/// Particles appear on deck cards as single character designators, either
/// after a colon (`imp:n`, `f4:p`, `cut:e`) or as a list on the `MODE` card.
///
/// ```rust
/// # use mcnptools_deck::Particle;
/// assert_eq!(Particle::from_designator('n'), Some(Particle::Neutron));
/// assert_eq!(Particle::from_designator('|'), Some(Particle::NegativeMuon));
/// assert_eq!(Particle::from_designator('j'), None);
///
/// // Comma separated lists from keyword suffixes
/// assert_eq!(
///     Particle::parse_list("n,p"),
///     Some(vec![Particle::Neutron, Particle::Photon])
/// );
/// assert_eq!(Particle::parse_list("n,j"), None);
/// ```
///
/// For reference, a full list of valid MCNP particle designators is shown
/// below:
///
/// | ID | Name                                  | Symbol   |
/// | -- | ------------------------------------- | -------- |
/// | 1  | neutron                               | n        |
/// | 2  | photon                                | p        |
/// | 3  | electron                              | e        |
/// | 4  | negative muon                         | \|       |
/// | 5  | anti neutron                          | q        |
/// | 6  | electron neutrino                     | u        |
/// | 7  | muon neutrino                         | v        |
/// | 8  | positron                              | f        |
/// | 9  | proton                                | h        |
/// | 10 | lambda baryon                         | l        |
/// | 11 | positive sigma baryon                 | +        |
/// | 12 | negative sigma baryon                 | -        |
/// | 13 | cascade; xi baryon                    | x        |
/// | 14 | negative cascade; negative xi baryon  | y        |
/// | 15 | omega baryon                          | o        |
/// | 16 | positive muon                         | !        |
/// | 17 | anti electron neutrino                | <        |
/// | 18 | anti muon neutrino                    | >        |
/// | 19 | anti proton                           | g        |
/// | 20 | positive pion                         | /        |
/// | 21 | neutral pion                          | z        |
/// | 22 | positive kaon                         | k        |
/// | 23 | kaon, short                           | %        |
/// | 24 | kaon, long                            | ^        |
/// | 25 | anti lambda baryon                    | b        |
/// | 26 | anti positive sigma baryon            | _        |
/// | 27 | anti negative sigma baryon            | ~        |
/// | 28 | anti cascade; anti neutral xi baryon  | c        |
/// | 29 | positive cascade; positive xi baryon  | w        |
/// | 30 | anti omega                            | @        |
/// | 31 | deuteron                              | d        |
/// | 32 | triton                                | t        |
/// | 33 | helion                                | s        |
/// | 34 | alpha particle                        | a        |
/// | 35 | negative pion                         | *        |
/// | 36 | negative kaon                         | ?        |
/// | 37 | heavy ions                            | #        |
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Ord, Eq, Hash, Serialize)]
pub enum Particle {
    Neutron = 1,
    Photon = 2,
    Electron = 3,
    NegativeMuon = 4,
    AntiNeutron = 5,
    ElectronNeutrino = 6,
    MuonNeutrino = 7,
    Positron = 8,
    Proton = 9,
    LambdaBaryon = 10,
    PosSigmaBaryon = 11,
    NegSigmaBaryon = 12,
    XiBaryon = 13,
    NegXiBaryon = 14,
    OmegaBaryon = 15,
    PosMuon = 16,
    AntiElectronNeutrino = 17,
    AntiMuonNeutrino = 18,
    AntiProton = 19,
    PosPion = 20,
    NeuPion = 21,
    PosKaon = 22,
    ShortKaon = 23,
    LongKaon = 24,
    AntiLambdaBaryon = 25,
    AntiPosSigmaBaryon = 26,
    AntiNegSigmaBaryon = 27,
    AntiNeuXiBaryon = 28,
    PosXiBaryon = 29,
    AntiOmega = 30,
    Deuteron = 31,
    Triton = 32,
    Helion = 33,
    Alpha = 34,
    NegPion = 35,
    NegKaon = 36,
    HeavyIon = 37,
}

/// Designator for every variant, in id order
const DESIGNATORS: [(char, Particle); 37] = [
    ('n', Particle::Neutron),
    ('p', Particle::Photon),
    ('e', Particle::Electron),
    ('|', Particle::NegativeMuon),
    ('q', Particle::AntiNeutron),
    ('u', Particle::ElectronNeutrino),
    ('v', Particle::MuonNeutrino),
    ('f', Particle::Positron),
    ('h', Particle::Proton),
    ('l', Particle::LambdaBaryon),
    ('+', Particle::PosSigmaBaryon),
    ('-', Particle::NegSigmaBaryon),
    ('x', Particle::XiBaryon),
    ('y', Particle::NegXiBaryon),
    ('o', Particle::OmegaBaryon),
    ('!', Particle::PosMuon),
    ('<', Particle::AntiElectronNeutrino),
    ('>', Particle::AntiMuonNeutrino),
    ('g', Particle::AntiProton),
    ('/', Particle::PosPion),
    ('z', Particle::NeuPion),
    ('k', Particle::PosKaon),
    ('%', Particle::ShortKaon),
    ('^', Particle::LongKaon),
    ('b', Particle::AntiLambdaBaryon),
    ('_', Particle::AntiPosSigmaBaryon),
    ('~', Particle::AntiNegSigmaBaryon),
    ('c', Particle::AntiNeuXiBaryon),
    ('w', Particle::PosXiBaryon),
    ('@', Particle::AntiOmega),
    ('d', Particle::Deuteron),
    ('t', Particle::Triton),
    ('s', Particle::Helion),
    ('a', Particle::Alpha),
    ('*', Particle::NegPion),
    ('?', Particle::NegKaon),
    ('#', Particle::HeavyIon),
];

impl Particle {
    /// Particle number as used in MCNP output files
    ///
    /// ```rust
    /// # use mcnptools_deck::Particle;
    /// assert_eq!(Particle::Electron.id(), 3);
    /// ```
    #[inline]
    pub fn id(&self) -> u8 {
        *self as u8
    }

    /// Single character deck designator
    ///
    /// ```rust
    /// # use mcnptools_deck::Particle;
    /// assert_eq!(Particle::HeavyIon.designator(), '#');
    /// ```
    pub fn designator(&self) -> char {
        DESIGNATORS[(self.id() - 1) as usize].0
    }

    /// Convert from a designator, ignoring case
    pub fn from_designator(c: char) -> Option<Self> {
        let c = c.to_ascii_lowercase();
        DESIGNATORS
            .iter()
            .find(|(symbol, _)| *symbol == c)
            .map(|(_, particle)| *particle)
    }

    /// Parse a comma separated designator list such as `n,p,e`
    ///
    /// Returns `None` if the list is empty or any entry is not a single valid
    /// designator.
    pub fn parse_list(s: &str) -> Option<Vec<Self>> {
        let mut particles = Vec::new();
        for item in s.split(',') {
            let mut chars = item.trim().chars();
            let particle = match (chars.next(), chars.next()) {
                (Some(c), None) => Self::from_designator(c)?,
                _ => return None,
            };
            if !particles.contains(&particle) {
                particles.push(particle);
            }
        }
        Some(particles)
    }
}

impl std::fmt::Display for Particle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.designator())
    }
}
