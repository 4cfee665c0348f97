// Mapper factory and board implementations

pub mod mapper0;
pub mod mapper2;

use std::error::Error;
use std::fmt;

use super::{Cartridge, Mapper};
use mapper0::Mapper0;
use mapper2::Mapper2;

/// Error type for mapper creation
#[derive(Debug)]
pub enum MapperError {
    /// The requested mapper number is not supported
    UnsupportedMapper(u8),
    /// The cartridge contents do not fit the board type
    InvalidConfiguration(String),
}

impl fmt::Display for MapperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapperError::UnsupportedMapper(num) => {
                write!(f, "mapper {} is not supported", num)
            }
            MapperError::InvalidConfiguration(msg) => {
                write!(f, "invalid mapper configuration: {}", msg)
            }
        }
    }
}

impl Error for MapperError {}

/// Create the mapper implementation named by the cartridge header
pub fn create_mapper(cartridge: Cartridge) -> Result<Box<dyn Mapper>, MapperError> {
    match cartridge.mapper {
        0 => Ok(Box::new(Mapper0::new(cartridge)?)),
        2 => Ok(Box::new(Mapper2::new(cartridge)?)),
        mapper_num => Err(MapperError::UnsupportedMapper(mapper_num)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::tests::build_ines;

    #[test]
    fn test_unsupported_mapper() {
        let data = build_ines(1, 1, 9, 0);
        let cartridge = Cartridge::from_ines_bytes(&data).unwrap();

        let result = create_mapper(cartridge);
        assert!(matches!(result, Err(MapperError::UnsupportedMapper(9))));
    }

    #[test]
    fn test_known_mappers_construct() {
        for mapper_num in [0u8, 2] {
            let data = build_ines(1, 1, mapper_num, 0);
            let cartridge = Cartridge::from_ines_bytes(&data).unwrap();
            assert!(
                create_mapper(cartridge).is_ok(),
                "mapper {} should construct",
                mapper_num
            );
        }
    }
}
