pub mod slot_time;
pub mod test_utils;

pub use slot_time::SlotTimeError;
