// Draft state mirroring and presentation derivation.

pub mod session;
pub mod view;
