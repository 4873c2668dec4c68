mod form_session;
mod product;

pub use form_session::*;
pub use product::*;
