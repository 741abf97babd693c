pub mod time;

// Re-export per comodità
pub use time::now_timestamp;
