pub mod urls;
pub mod zips;

pub use urls::{detail_zip_name, detail_zip_url, year_from_zip_name};
pub use zips::download_detail_zip;
