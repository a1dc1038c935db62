pub mod table;

pub use table::{Persona, PersonaTable};
