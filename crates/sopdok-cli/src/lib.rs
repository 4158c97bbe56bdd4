//! sopdok CLI - Command-line interface library
//!
//! - Serve: run the HTTP export service
//! - Export: render one HTML file to PDF or DOCX
//! - Pages: show how a document splits into pages
//! - Paginate: run the page-break calculator over a measurement snapshot
//!
//! # Binary Usage
//!
//! ```bash
//! # Run the export service from environment configuration
//! GOTENBERG_URL=http://localhost:3000 sopdok serve
//!
//! # Export a document
//! sopdok export sop.html --format docx --title "Hand Hygiene"
//!
//! # Page breaks for captured measurements
//! sopdok paginate measurements.json --footer signature --format json
//! ```

pub mod app;

pub use app::{
    export_command, pages_command, pages_report, paginate_command, paginate_report,
    serve_command,
};
pub use app::{run_cli, ExportSettings, FormatArg, OutputFormat};
