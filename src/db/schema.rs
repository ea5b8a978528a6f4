pub const SCHEMA: &str = r#"
-- Sessions: one shoot, edited folder plus optional RAW folder
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    category TEXT,
    group_name TEXT,
    date TEXT,                      -- YYYY-MM-DD
    description TEXT,
    folder_path TEXT,
    raw_folder_path TEXT,

    total_photos INTEGER NOT NULL DEFAULT 0,
    total_raw_photos INTEGER,       -- NULL: no RAW folder found
    hit_rate REAL,

    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_sessions_category ON sessions(category);
CREATE INDEX IF NOT EXISTS idx_sessions_group ON sessions(group_name);
CREATE INDEX IF NOT EXISTS idx_sessions_date ON sessions(date);

-- Photos: EXIF facts for each edited photo
CREATE TABLE IF NOT EXISTS photos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id INTEGER NOT NULL,
    file_path TEXT NOT NULL,
    file_name TEXT NOT NULL,

    camera TEXT,
    lens TEXT,
    aperture REAL,
    shutter_speed TEXT,
    shutter_speed_decimal REAL,
    iso INTEGER,
    focal_length REAL,
    exposure_program TEXT,
    exposure_bias REAL,
    flash_mode TEXT,

    -- Derived from date_taken
    date_taken TEXT,                -- YYYY-MM-DDTHH:MM:SS
    date_only TEXT,
    time_only TEXT,
    day_of_week TEXT,
    time_of_day TEXT,

    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (session_id, file_path),
    FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_photos_session ON photos(session_id);
CREATE INDEX IF NOT EXISTS idx_photos_lens ON photos(lens);
CREATE INDEX IF NOT EXISTS idx_photos_date_taken ON photos(date_taken);

-- Lenses: registry of every lens name seen, with derived metadata
CREATE TABLE IF NOT EXISTS lenses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    lens_type TEXT NOT NULL,        -- prime/zoom/unknown
    manufacturer TEXT,
    focal_length_min REAL,
    focal_length_max REAL,
    max_aperture REAL,
    usage_count INTEGER NOT NULL DEFAULT 0
);
"#;

/// Additive changes for databases created by older versions. Each statement
/// fails harmlessly when already applied.
pub const MIGRATIONS: &[&str] = &[
    "ALTER TABLE sessions ADD COLUMN description TEXT",
    "ALTER TABLE sessions ADD COLUMN raw_folder_path TEXT",
    "ALTER TABLE photos ADD COLUMN exposure_bias REAL",
    "ALTER TABLE photos ADD COLUMN time_of_day TEXT",
];
