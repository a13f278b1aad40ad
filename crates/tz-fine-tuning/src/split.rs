//! Train/validation partitioning of curated rows.

/// Rows partitioned for upload. Both halves keep the input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitData<T> {
    pub train: Vec<T>,
    pub validation: Vec<T>,
}

/// Splits `rows` so that the last `validation_split_percent` percent go to validation.
///
/// The split index is `floor(n * (1 - p / 100))`. With `p == 0` every row is for training.
pub fn split_validation_data<T>(mut rows: Vec<T>, validation_split_percent: u32) -> SplitData<T> {
    if validation_split_percent == 0 {
        return SplitData { train: rows, validation: Vec::new() };
    }
    let percent = validation_split_percent.min(100) as usize;
    let split_index = rows.len() * (100 - percent) / 100;
    let validation = rows.split_off(split_index);
    SplitData { train: rows, validation }
}
