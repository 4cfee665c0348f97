// Hardware profile configuration
//
// A profile captures the machine variant being emulated: the PPU-per-CPU
// clock ratio, how undocumented opcodes are treated, the RAM/register
// mirroring layout and the interrupt vector locations. Profiles are
// validated once, at system construction; a profile that fails validation
// never reaches the tick loop.

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// What to do when the CPU fetches an undocumented opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IllegalOpcodePolicy {
    /// Raise a hardware fault and pause
    Trap,
    /// Execute the documented behavior of the undocumented opcode
    Emulate,
}

/// Exact PPU-per-CPU clock ratio as a rational number
///
/// Carried as numerator/denominator so the scheduler can accumulate
/// remainders in integers. NTSC is 3/1; PAL is 16/5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRatio {
    pub numerator: u32,
    pub denominator: u32,
}

impl CycleRatio {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        CycleRatio {
            numerator,
            denominator,
        }
    }
}

/// One address-range mirroring rule
///
/// Addresses in `start..=end` fold to `start + (addr - start) % period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRule {
    pub start: u16,
    pub end: u16,
    pub period: u16,
}

/// Interrupt vector locations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vectors {
    pub nmi: u16,
    pub reset: u16,
    pub irq: u16,
}

/// Error type for profile validation and persistence
#[derive(Debug)]
pub enum ProfileError {
    /// A cycle ratio component is zero
    ZeroRatio,
    /// A mirror rule's period is zero
    ZeroPeriod { rule: usize },
    /// A mirror rule's range is inverted
    InvertedRange { rule: usize },
    /// A mirror rule's period exceeds its range
    PeriodExceedsRange { rule: usize },
    /// Mirror rules overlap, making decode ambiguous
    OverlappingRules { first: usize, second: usize },
    /// Reading or writing the profile file failed
    Io(std::io::Error),
    /// The profile file is not valid TOML
    Parse(toml::de::Error),
    /// The profile could not be serialized
    Serialize(toml::ser::Error),
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileError::ZeroRatio => {
                write!(f, "cycle ratio numerator and denominator must be nonzero")
            }
            ProfileError::ZeroPeriod { rule } => {
                write!(f, "mirror rule {} has a zero period", rule)
            }
            ProfileError::InvertedRange { rule } => {
                write!(f, "mirror rule {} has start above end", rule)
            }
            ProfileError::PeriodExceedsRange { rule } => {
                write!(f, "mirror rule {} has a period larger than its range", rule)
            }
            ProfileError::OverlappingRules { first, second } => {
                write!(f, "mirror rules {} and {} overlap", first, second)
            }
            ProfileError::Io(err) => write!(f, "failed to read profile: {}", err),
            ProfileError::Parse(err) => write!(f, "failed to parse profile: {}", err),
            ProfileError::Serialize(err) => {
                write!(f, "failed to serialize profile: {}", err)
            }
        }
    }
}

impl Error for ProfileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ProfileError::Io(err) => Some(err),
            ProfileError::Parse(err) => Some(err),
            ProfileError::Serialize(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ProfileError {
    fn from(err: std::io::Error) -> Self {
        ProfileError::Io(err)
    }
}

/// The full hardware profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareProfile {
    /// Human-readable variant name
    pub name: String,
    /// PPU cycles per CPU cycle
    pub cycle_ratio: CycleRatio,
    /// Undocumented opcode handling
    pub illegal_opcodes: IllegalOpcodePolicy,
    /// Address mirroring layout
    pub mirror_rules: Vec<MirrorRule>,
    /// Interrupt vector locations
    pub vectors: Vectors,
}

impl HardwareProfile {
    /// The NTSC console profile
    pub fn ntsc() -> Self {
        HardwareProfile {
            name: "NTSC".to_string(),
            cycle_ratio: CycleRatio::new(3, 1),
            illegal_opcodes: IllegalOpcodePolicy::Trap,
            mirror_rules: vec![
                // 2KB internal RAM repeats through $1FFF
                MirrorRule {
                    start: 0x0000,
                    end: 0x1FFF,
                    period: 0x0800,
                },
                // The eight PPU registers repeat through $3FFF
                MirrorRule {
                    start: 0x2000,
                    end: 0x3FFF,
                    period: 0x0008,
                },
            ],
            vectors: Vectors {
                nmi: 0xFFFA,
                reset: 0xFFFC,
                irq: 0xFFFE,
            },
        }
    }

    /// The PAL console profile (same memory layout, 16/5 clock ratio)
    pub fn pal() -> Self {
        HardwareProfile {
            name: "PAL".to_string(),
            cycle_ratio: CycleRatio::new(16, 5),
            ..Self::ntsc()
        }
    }

    /// Check every constraint a profile must satisfy
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.cycle_ratio.numerator == 0 || self.cycle_ratio.denominator == 0 {
            return Err(ProfileError::ZeroRatio);
        }

        for (i, rule) in self.mirror_rules.iter().enumerate() {
            if rule.period == 0 {
                return Err(ProfileError::ZeroPeriod { rule: i });
            }
            if rule.start > rule.end {
                return Err(ProfileError::InvertedRange { rule: i });
            }
            let span = rule.end as u32 - rule.start as u32 + 1;
            if rule.period as u32 > span {
                return Err(ProfileError::PeriodExceedsRange { rule: i });
            }
        }

        for i in 0..self.mirror_rules.len() {
            for j in (i + 1)..self.mirror_rules.len() {
                let (a, b) = (&self.mirror_rules[i], &self.mirror_rules[j]);
                if a.start <= b.end && b.start <= a.end {
                    return Err(ProfileError::OverlappingRules {
                        first: i,
                        second: j,
                    });
                }
            }
        }

        Ok(())
    }

    /// Fold an address through the first matching mirror rule
    pub fn mirror(&self, address: u16) -> u16 {
        for rule in &self.mirror_rules {
            if address >= rule.start && address <= rule.end {
                return rule.start + (address - rule.start) % rule.period;
            }
        }
        address
    }

    /// Load a profile from a TOML file, validating it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProfileError> {
        let contents = fs::read_to_string(path)?;
        let profile: HardwareProfile =
            toml::from_str(&contents).map_err(ProfileError::Parse)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load a profile, falling back to NTSC when the file is absent
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_else(|_| Self::ntsc())
    }

    /// Write the profile out as TOML
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ProfileError> {
        let contents = toml::to_string_pretty(self).map_err(ProfileError::Serialize)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

impl Default for HardwareProfile {
    fn default() -> Self {
        Self::ntsc()
    }
}
