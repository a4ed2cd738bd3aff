pub mod numeric;
pub mod order;
pub mod paths;
pub mod person;
pub mod user;

pub use numeric::parse_float_loose;
pub use order::{Order, OrderCreate, OrderEdit, OrderStatus};
pub use person::{Person, PersonCreate};
pub use user::User;
