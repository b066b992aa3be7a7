pub mod inspect;
pub mod roster;
pub mod stamp;
