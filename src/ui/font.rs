use std::fs;

use ab_glyph::FontArc;
use fontdb::{Database, Family, Query, Source};
use tracing::debug;

use crate::error::{Error, Result};

static FALLBACK_FAMILIES: [&str; 5] = [
    "Helvetica",
    "Liberation Sans",
    "DejaVu Sans",
    "Noto Sans",
    "Cantarell",
];

/// Loads `preferred` from the system fonts, falling back to common sans faces.
pub fn load_font(preferred: &str) -> Result<FontArc> {
    let mut db = Database::new();
    db.load_system_fonts();

    let mut families: Vec<Family<'_>> = vec![Family::Name(preferred)];
    families.extend(
        FALLBACK_FAMILIES
            .iter()
            .filter(|name| !name.eq_ignore_ascii_case(preferred))
            .map(|name| Family::Name(*name)),
    );
    families.push(Family::SansSerif);

    for family in families {
        if let Some(id) = db.query(&Query {
            families: &[family],
            ..Default::default()
        }) && let Some(font) = load_face(&db, id)?
        {
            debug!(family = ?family_label(&family), "loaded UI font");
            return Ok(font);
        }
    }

    for face in db.faces() {
        if let Some(font) = load_face(&db, face.id)? {
            return Ok(font);
        }
    }

    Err(Error::Ui("no usable system font found".into()))
}

fn family_label(family: &Family<'_>) -> String {
    match family {
        Family::Name(name) => (*name).to_string(),
        Family::SansSerif => "sans-serif".to_string(),
        other => format!("{other:?}"),
    }
}

fn load_face(db: &Database, id: fontdb::ID) -> Result<Option<FontArc>> {
    let Some(face) = db.face(id) else {
        return Ok(None);
    };
    let data = match &face.source {
        Source::Binary(data) => data.as_ref().as_ref().to_vec(),
        Source::File(path) => fs::read(path)?,
        Source::SharedFile(_, data) => data.as_ref().as_ref().to_vec(),
    };
    // Collections (.ttc) and odd formats are skipped rather than fatal.
    Ok(FontArc::try_from_vec(data).ok())
}
