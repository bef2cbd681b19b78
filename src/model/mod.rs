//! Value model: stack values, persistent lists, the total ordering over
//! values, coercions and the graph-store boundary.

pub mod coercion;
pub mod comparator;
pub mod connection;
pub mod list;
pub mod memory;
pub mod value;
pub mod vocab;

pub use comparator::{compare, equal};
pub use connection::{Connection, ModelConnection, StoreError, StoreResult};
pub use list::StackList;
pub use memory::MemoryStore;
pub use value::{Literal, Numeric, ResourceId, Value};
