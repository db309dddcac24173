pub mod companion;
pub mod config;
pub mod converter;
pub mod error;
pub mod mapper;
pub mod model;
pub mod parser;
pub mod vocabulary;
pub mod writer;

pub use companion::{CompanionIndex, GeometryReader, OgrReader};
pub use config::{CatalogConfig, MapperConfig, Namespaces};
pub use converter::{collect_metadata_files, BatchReport, Converter};
pub use error::{Error, Result};
pub use mapper::Mapper;
pub use model::{DataType, GblRecord, MetadataFile, References};
pub use parser::{parse_document, parse_file, Document};
pub use vocabulary::TopicVocabulary;
pub use writer::JsonWriter;
