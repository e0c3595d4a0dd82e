#![allow(missing_docs)]

use std::borrow::Cow;

use log::{debug, warn};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::{TiffRasterError, TiffRasterResult};
use crate::ifd::{
    optional_ascii, optional_double_array, optional_ushort, optional_ushort_array,
    search_sorted, sort_entries, Directory, Entry, Ifd,
};
use crate::tiff::tags::Tag;

/// A GeoKey id together with its user-friendly name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeoKey {
    pub id: u16,
    pub name: &'static str,
}

impl GeoKey {
    const fn new(id: u16, name: &'static str) -> Self {
        Self { id, name }
    }

    pub const MODEL_TYPE: GeoKey = GeoKey::new(0x0400, "GT_MODEL_TYPE");
    pub const RASTER_TYPE: GeoKey = GeoKey::new(0x0401, "GT_RASTER_TYPE");
    pub const CITATION: GeoKey = GeoKey::new(0x0402, "GT_CITATION");
    pub const GEODETIC_CRS: GeoKey = GeoKey::new(0x0800, "GEODETIC_CRS");
    pub const GEODETIC_CITATION: GeoKey = GeoKey::new(0x0801, "GEODETIC_CITATION");
    pub const GEOG_ANGULAR_UNITS: GeoKey = GeoKey::new(0x0806, "GEOG_ANGULAR_UNITS");
    pub const GEOG_SEMI_MAJOR_AXIS: GeoKey = GeoKey::new(0x0809, "GEOG_SEMI_MAJOR_AXIS");
    pub const PROJECTED_CRS: GeoKey = GeoKey::new(0x0C00, "PROJECTED_CRS");
    pub const VERTICAL_CRS: GeoKey = GeoKey::new(0x1000, "VERTICAL_CRS");
}

/// Units for angles, GeoTIFF codes 9101 to 9108.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum AngularUnit {
    Radian = 9101,
    Degree = 9102,
    ArcMinute = 9103,
    ArcSecond = 9104,
    Grad = 9105,
    Gon = 9106,
    Dms = 9107,
    DmsHemisphere = 9108,
}

/// GeoTIFF raster type when GT_RASTER_TYPE is absent: PixelIsArea.
const RASTER_PIXEL_IS_AREA: u16 = 1;

/// The GeoKeyDirectory of an IFD: a second, smaller directory stored inside the
/// GeoKeyDirectory tag.
///
/// Key values are resolved when the directory is built, so a key reads exactly like a tag:
/// [`find_key`][Self::find_key] never fails, and the accessors reject values of the wrong
/// type.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoKeyDirectory {
    version: u16,
    key_revision: u16,
    minor_revision: u16,
    keys: Vec<Entry>,
}

impl Directory for GeoKeyDirectory {
    type Key = GeoKey;

    fn find(&self, key: GeoKey) -> Cow<'_, Entry> {
        self.find_key(key.id)
    }

    fn missing(key: GeoKey) -> TiffRasterError {
        TiffRasterError::MissingRequiredGeoKey {
            name: key.name,
            id: key.id,
        }
    }

    fn unsupported(key: GeoKey, found: &Entry) -> TiffRasterError {
        TiffRasterError::UnsupportedTypeForGeoKey {
            name: key.name,
            id: key.id,
            found: found.type_name(),
        }
    }
}

fn invalid(reason: String) -> TiffRasterError {
    TiffRasterError::InvalidGeoKeyDirectory(reason)
}

impl GeoKeyDirectory {
    /// The GeoKeyDirectory of `ifd`, `None` if it has no GeoKeyDirectory tag.
    pub fn from_ifd(ifd: &Ifd) -> TiffRasterResult<Option<Self>> {
        match optional_ushort_array(ifd, Tag::GEO_KEY_DIRECTORY)? {
            Some(shorts) => Self::from_shorts(&shorts, ifd).map(Some),
            None => Ok(None),
        }
    }

    fn from_shorts(shorts: &[u16], ifd: &Ifd) -> TiffRasterResult<Self> {
        let [version, key_revision, minor_revision, count, records @ ..] = shorts else {
            return Err(invalid(format!("{} values, a header needs 4", shorts.len())));
        };
        if *version != 1 {
            return Err(invalid(format!("KeyDirectoryVersion {version}, expected 1")));
        }
        if *key_revision != 1 {
            return Err(invalid(format!("KeyRevision {key_revision}, expected 1")));
        }
        if *minor_revision > 1 {
            return Err(invalid(format!("MinorRevision {minor_revision}, expected 0 or 1")));
        }
        let record_values = *count as usize * 4;
        if *count == 0 || records.len() < record_values {
            return Err(invalid(format!(
                "{count} keys declared but {} values follow the header",
                records.len()
            )));
        }
        debug!("Reading {count} GeoKeys, revision {key_revision}.{minor_revision}");

        let keys = records[..record_values]
            .chunks_exact(4)
            .map(|record| Self::resolve(shorts, ifd, record[0], record[1], record[2], record[3]))
            .collect::<TiffRasterResult<Vec<_>>>()?;
        Ok(Self {
            version: *version,
            key_revision: *key_revision,
            minor_revision: *minor_revision,
            keys: sort_entries(keys, "GeoKey"),
        })
    }

    /// Resolve one key record to its values.
    ///
    /// Location 0 holds a single Short in place. Location GeoKeyDirectory points back into this
    /// directory's own Shorts. Any other location names the tag the values are copied from,
    /// usually GeoDoubleParams or GeoAsciiParams.
    fn resolve(
        shorts: &[u16],
        ifd: &Ifd,
        key: u16,
        location: u16,
        count: u16,
        value_offset: u16,
    ) -> TiffRasterResult<Entry> {
        let range = value_offset as usize..value_offset as usize + count as usize;
        if location == 0 {
            return Ok(Entry::Short {
                tag: key,
                values: vec![value_offset],
            });
        }
        if location == Tag::GEO_KEY_DIRECTORY.id {
            return match shorts.get(range.clone()) {
                Some(values) => Ok(Entry::Short {
                    tag: key,
                    values: values.to_vec(),
                }),
                None => Err(invalid(format!(
                    "key {key} reads values {range:?} of a directory of {}",
                    shorts.len()
                ))),
            };
        }

        let source = ifd.find_tag(location);
        if let Entry::NotFound { .. } = source.as_ref() {
            warn!("GeoKey {key} refers to absent tag {location}");
            return Ok(Entry::NotFound { tag: key });
        }
        let entry = source.copy_range(key, range.clone()).ok_or_else(|| {
            invalid(format!(
                "key {key} reads values {range:?} of tag {location}, which holds {}",
                source.len()
            ))
        })?;
        Ok(match entry {
            Entry::Ascii { tag, mut values } => {
                if values.last() == Some(&b'|') {
                    values.pop();
                }
                Entry::Ascii { tag, values }
            }
            other => other,
        })
    }

    /// KeyDirectoryVersion, always 1.
    pub fn version(&self) -> u16 {
        self.version
    }

    /// KeyRevision, always 1.
    pub fn key_revision(&self) -> u16 {
        self.key_revision
    }

    /// MinorRevision, 0 or 1.
    pub fn minor_revision(&self) -> u16 {
        self.minor_revision
    }

    /// All keys with their resolved values, sorted by key id.
    pub fn keys(&self) -> &[Entry] {
        &self.keys
    }

    /// Look up a key by id.
    ///
    /// Never fails: an absent key yields [`Entry::NotFound`].
    pub fn find_key(&self, id: u16) -> Cow<'_, Entry> {
        search_sorted(&self.keys, id)
    }

    /// GTModelTypeGeoKey: 1 projected, 2 geographic, 3 geocentric. Required by GeoTIFF.
    pub fn model_type(&self) -> TiffRasterResult<u16> {
        optional_ushort(self, GeoKey::MODEL_TYPE)?.ok_or_else(|| Self::missing(GeoKey::MODEL_TYPE))
    }

    /// GTRasterTypeGeoKey, defaulting to 1 (PixelIsArea).
    pub fn raster_type(&self) -> TiffRasterResult<u16> {
        Ok(optional_ushort(self, GeoKey::RASTER_TYPE)?.unwrap_or(RASTER_PIXEL_IS_AREA))
    }

    pub fn citation(&self) -> TiffRasterResult<Option<String>> {
        optional_ascii(self, GeoKey::CITATION)
    }

    /// EPSG code of the geodetic CRS.
    pub fn geodetic_crs(&self) -> TiffRasterResult<Option<u16>> {
        optional_ushort(self, GeoKey::GEODETIC_CRS)
    }

    pub fn geodetic_citation(&self) -> TiffRasterResult<Option<String>> {
        optional_ascii(self, GeoKey::GEODETIC_CITATION)
    }

    pub fn geo_angular_unit(&self) -> TiffRasterResult<Option<AngularUnit>> {
        optional_ushort(self, GeoKey::GEOG_ANGULAR_UNITS)?
            .map(|code| {
                AngularUnit::try_from(code).map_err(|_| TiffRasterError::UnknownValue {
                    name: GeoKey::GEOG_ANGULAR_UNITS.name,
                    code: code.into(),
                })
            })
            .transpose()
    }

    pub fn geog_semi_major_axis(&self) -> TiffRasterResult<Option<f64>> {
        Ok(optional_double_array(self, GeoKey::GEOG_SEMI_MAJOR_AXIS)?
            .and_then(|values| values.first().copied()))
    }

    /// EPSG code of the projected CRS.
    pub fn projected_crs(&self) -> TiffRasterResult<Option<u16>> {
        optional_ushort(self, GeoKey::PROJECTED_CRS)
    }

    /// EPSG code of the vertical CRS.
    pub fn vertical_crs(&self) -> TiffRasterResult<Option<u16>> {
        optional_ushort(self, GeoKey::VERTICAL_CRS)
    }
}
