/// Column and value constants shared by the loader, the writer and the Farms table.
/// The writer header and the database insert column list are both built from
/// `OUTPUT_COLUMNS`, so the two cannot drift apart silently.

// Canonical listing attributes kept by the column projector
pub const COL_NAME: &str = "name";
pub const COL_WEBSITE: &str = "website";
pub const COL_MAIN_CATEGORY: &str = "main_category";
pub const COL_CATEGORIES: &str = "categories";
pub const COL_PHONE: &str = "phone";
pub const COL_ADDRESS: &str = "address";
pub const COL_COORDINATES: &str = "coordinates";
pub const COL_LINK: &str = "link";

// Derived attributes added by the pipeline
pub const COL_LATITUDE: &str = "latitude";
pub const COL_LONGITUDE: &str = "longitude";
pub const COL_ANIMAL_TYPE: &str = "animal_type";
pub const COL_GEOMETRY: &str = "geometry";
pub const COL_COUNTRY: &str = "country";
pub const COL_STATE: &str = "state";
pub const COL_DEPARTMENT: &str = "department";

/// Columns every raw listing file must carry
pub const LISTING_COLUMNS: [&str; 8] = [
    COL_NAME,
    COL_WEBSITE,
    COL_MAIN_CATEGORY,
    COL_CATEGORIES,
    COL_PHONE,
    COL_ADDRESS,
    COL_COORDINATES,
    COL_LINK,
];

/// Cleaned output schema, in write order
pub const OUTPUT_COLUMNS: [&str; 15] = [
    COL_NAME,
    COL_WEBSITE,
    COL_MAIN_CATEGORY,
    COL_CATEGORIES,
    COL_PHONE,
    COL_ADDRESS,
    COL_COORDINATES,
    COL_LINK,
    COL_LATITUDE,
    COL_LONGITUDE,
    COL_ANIMAL_TYPE,
    COL_GEOMETRY,
    COL_COUNTRY,
    COL_STATE,
    COL_DEPARTMENT,
];

/// Main category given to listings whose primary category is ambiguous
pub const MULTIPLE_CATEGORY: &str = "multiple";

/// Separator used by the scraper inside the raw `categories` cell
pub const CATEGORY_SEPARATOR: &str = ", ";

/// Suffix appended to the input file stem for the cleaned output
pub const CLEANED_SUFFIX: &str = "_cleaned";

/// Table the persistence loader writes into
pub const FARMS_TABLE: &str = "Farms";

/// Top-level output directory skipped by the raw-file merger
pub const MERGED_OUTPUT_DIR: &str = "all";

/// Per-region subdirectory holding scraper CSV files
pub const SCRAPER_CSV_DIR: &str = "csv";
