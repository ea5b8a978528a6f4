pub mod lens;
pub mod photo;
pub mod session;

pub use lens::{classify, looks_like_zoom, LensInfo, LensType};
pub use photo::{format_decimal, PhotoRecord, TimeOfDay, UNCATEGORIZED, UNGROUPED};
pub use session::{hit_rate, is_valid_for_hit_rate, Session};
