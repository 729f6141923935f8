use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("Table {table_idx} does not exist ({table_count} table(s) loaded)")]
    TableOutOfRange {
        table_idx: usize,
        table_count: usize,
    },
    #[error("Row {row_idx} is out of range for a table with {row_count} row(s)")]
    RowOutOfRange { row_idx: usize, row_count: usize },
    #[error("Column {col_idx} is out of range for a table with {col_count} column(s)")]
    ColumnOutOfRange { col_idx: usize, col_count: usize },
    #[error("Cannot merge column {0} with itself")]
    MergeSameColumn(usize),
    #[error("No merge to revert")]
    NoMergeToRevert,
    #[error("No reference row has been set")]
    NoReferenceRow,
    #[error("No cell is currently being edited")]
    NoActiveEdit,
}

pub type EditResult<T> = std::result::Result<T, EditError>;
