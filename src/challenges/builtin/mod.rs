pub mod caesar;
pub mod classes;
pub mod fizzbuzz;
pub mod hello_world;
pub mod longest_string;
pub mod outside_the_box;
pub mod palindrome;

pub use caesar::{CaesarI, CaesarII};
pub use classes::Classes;
pub use fizzbuzz::FizzBuzz;
pub use hello_world::HelloWorld;
pub use longest_string::LongestString;
pub use outside_the_box::OutsideTheBox;
pub use palindrome::Palindrome;

use super::registry::ChallengeRegistry;
use crate::progress::ProgressionError;

/// Registers the builtin catalog. Prerequisites are registered before
/// the challenges that name them.
pub fn register_all(registry: &mut ChallengeRegistry) -> Result<(), ProgressionError> {
    registry.register(Box::new(HelloWorld))?;
    registry.register(Box::new(LongestString))?;
    registry.register(Box::new(FizzBuzz))?;
    registry.register(Box::new(Palindrome))?;
    registry.register(Box::new(CaesarI))?;
    registry.register(Box::new(CaesarII))?;
    registry.register(Box::new(Classes))?;
    registry.register(Box::new(OutsideTheBox))?;
    Ok(())
}
