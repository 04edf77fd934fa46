// ==========================================
// Marking Maestro - Import layer
// ==========================================
// Responsibility: roster files -> domain entities -> repositories
// Supported: Excel, CSV
// ==========================================

pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod roster_importer;
pub mod validator;

pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRow, RawTable, UniversalFileParser};
pub use roster_importer::{ImportKind, ImportSummary, RosterImporter};
pub use validator::ImportValidator;
