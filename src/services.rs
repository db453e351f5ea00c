pub mod averages_service;
pub mod export_service;

pub use averages_service::{AveragesError, AveragesService, AveragesView, SchemaResponse};
pub use export_service::{DisplayTable, ExportError, ExportFile};
