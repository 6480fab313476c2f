//! Domain model for the keyed store: keys, typed entities, index
//! positions, conditions, pagination, and change records.

mod change;
mod condition;
mod entity;
mod key;
mod page;

pub use change::{ChangeKind, ChangeRecord};
pub use condition::WriteCondition;
pub use entity::{Entity, EntityKind};
pub use key::{IndexEntry, IndexName, ItemKey};
pub use page::{
    Cursor, CursorPosition, DEFAULT_PAGE_LIMIT, IndexQuery, InvalidCursor, Page, PageRequest,
};
