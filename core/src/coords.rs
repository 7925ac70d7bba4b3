use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::model::{Coord, LocationDescriptor, UNKNOWN_LOCATION, coord_from_value};

/// Places outside the domestic reference data, keyed like foreign
/// descriptors (`country city`).
pub const INTERNATIONAL_COORDINATES: &[(&str, Coord)] = &[("俄罗斯 莫斯科", [37.6176, 55.7558])];

// ── Reference geography file ─────────────────────────────────────────────

/// `china_regions_coordinates.json`: `{ "regions": [...] }`.
///
/// Entries are kept loosely typed so a single malformed region is skipped
/// instead of failing the whole file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionsDocument {
    #[serde(default)]
    pub regions: Vec<RegionRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionRecord {
    /// Administrative path, e.g. "湖南省 长沙市 岳麓区"
    #[serde(default, alias = "path")]
    pub ext_path: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Value>,
}

impl RegionRecord {
    /// The record's `[lng, lat]`, if it is exactly two finite numbers.
    pub fn coord(&self) -> Option<Coord> {
        self.coordinates.as_ref().and_then(coord_from_value)
    }
}

// ── Index ────────────────────────────────────────────────────────────────

/// Counters from building an index; logged once and kept for `check`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub reference_entries: usize,
    pub skipped_entries: usize,
    pub duplicate_keys: usize,
    pub international_entries: usize,
}

/// Administrative path → coordinates.
#[derive(Debug, Clone, Default)]
pub struct CoordinateIndex {
    entries: HashMap<String, Coord>,
    stats: IndexStats,
}

/// Outcome of resolving one descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub coordinates: Option<Coord>,
    pub label: String,
    /// Lookup key; `None` when the descriptor had direct coordinates or no
    /// usable fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        self.coordinates.is_some()
    }
}

impl CoordinateIndex {
    /// Build from reference regions, then add the international table.
    ///
    /// Within the reference data the first entry for a key wins. The
    /// international table only fills keys the reference data lacks.
    pub fn from_regions<'a>(regions: impl IntoIterator<Item = &'a RegionRecord>) -> Self {
        let mut index = Self::default();

        for region in regions {
            let (Some(path), Some(coord)) = (
                region.ext_path.as_deref().filter(|p| !p.is_empty()),
                region.coord(),
            ) else {
                index.stats.skipped_entries += 1;
                continue;
            };
            if index.entries.contains_key(path) {
                debug!(path, "duplicate region path, keeping first entry");
                index.stats.duplicate_keys += 1;
                continue;
            }
            index.entries.insert(path.to_string(), coord);
            index.stats.reference_entries += 1;
        }

        index.add_international();
        info!(
            entries = index.len(),
            skipped = index.stats.skipped_entries,
            duplicates = index.stats.duplicate_keys,
            "coordinate index built"
        );
        index
    }

    /// Index holding only the international table. Used when the reference
    /// geography cannot be loaded.
    pub fn international_only() -> Self {
        let mut index = Self::default();
        index.add_international();
        index
    }

    fn add_international(&mut self) {
        for (name, coord) in INTERNATIONAL_COORDINATES {
            if self.entries.contains_key(*name) {
                debug!(name, "international entry shadowed by reference data");
                self.stats.duplicate_keys += 1;
                continue;
            }
            self.entries.insert((*name).to_string(), *coord);
            self.stats.international_entries += 1;
        }
    }

    pub fn get(&self, path: &str) -> Option<Coord> {
        self.entries.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    /// Resolve a descriptor to coordinates and a display label.
    ///
    /// Never fails: a miss is logged and returned with `coordinates: None`
    /// and the label still filled in.
    pub fn resolve(&self, descriptor: &LocationDescriptor) -> Resolution {
        let label = format_label(descriptor);

        if let Some(coord) = descriptor.direct_coord() {
            return Resolution {
                coordinates: Some(coord),
                label,
                key: None,
            };
        }
        if descriptor.coordinates.is_some() {
            debug!(%label, "ignoring malformed direct coordinates");
        }

        let key = lookup_key(descriptor);
        let coordinates = key.as_deref().and_then(|k| self.get(k));
        if coordinates.is_none() {
            warn!(key = key.as_deref().unwrap_or(""), %label, "no coordinates for location");
        }
        Resolution {
            coordinates,
            label,
            key,
        }
    }
}

// ── Path composition ─────────────────────────────────────────────────────

/// Ordered, de-duplicated name parts for a descriptor.
///
/// Foreign: `country [city]`. Domestic: `[province] [city] [district]`,
/// dropping a city equal to the province and a district equal to the city.
fn path_parts(d: &LocationDescriptor) -> Vec<&str> {
    let mut parts = Vec::with_capacity(3);

    if d.is_foreign() {
        parts.extend(d.country());
        parts.extend(d.city());
        return parts;
    }

    let province = d.province();
    let city = d.city();
    parts.extend(province);
    if let Some(c) = city
        && Some(c) != province
    {
        parts.push(c);
    }
    if let Some(dist) = d.district()
        && Some(dist) != city
    {
        parts.push(dist);
    }
    parts
}

/// Key into the coordinate index, e.g. "湖南省 湘潭市 韶山市".
pub fn lookup_key(descriptor: &LocationDescriptor) -> Option<String> {
    let parts = path_parts(descriptor);
    (!parts.is_empty()).then(|| parts.join(" "))
}

/// Human-readable place name; "未知地点" when nothing is given.
pub fn format_label(descriptor: &LocationDescriptor) -> String {
    lookup_key(descriptor).unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
}

/// Map key for grouping events at the same point: "lng,lat".
pub fn coord_key(coord: &Coord) -> String {
    format!("{},{}", coord[0], coord[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DOMESTIC_COUNTRY;
    use serde_json::json;

    fn region(path: &str, coords: Value) -> RegionRecord {
        RegionRecord {
            ext_path: Some(path.to_string()),
            coordinates: Some(coords),
        }
    }

    fn domestic(province: &str, city: &str, district: &str) -> LocationDescriptor {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        LocationDescriptor {
            province: opt(province),
            city: opt(city),
            district: opt(district),
            ..Default::default()
        }
    }

    fn sample_index() -> CoordinateIndex {
        let regions = vec![
            region("湖南省 湘潭市 韶山市", json!([112.52, 27.92])),
            region("湖南省 长沙市", json!([112.94, 28.23])),
            region("北京", json!([116.40, 39.90])),
            region("陕西省 延安市 宝塔区", json!([109.49, 36.59])),
        ];
        CoordinateIndex::from_regions(&regions)
    }

    // ── index construction ───────────────────────────────────────────

    #[test]
    fn test_index_skips_malformed_regions() {
        let regions = vec![
            region("湖南省 长沙市", json!([112.94, 28.23])),
            region("", json!([1.0, 2.0])),
            region("缺坐标", json!([1.0])),
            region("三个数", json!([1.0, 2.0, 3.0])),
            region("字符串", json!(["112", "28"])),
            RegionRecord {
                ext_path: None,
                coordinates: Some(json!([1.0, 2.0])),
            },
        ];
        let index = CoordinateIndex::from_regions(&regions);
        assert_eq!(index.get("湖南省 长沙市"), Some([112.94, 28.23]));
        assert_eq!(index.stats().reference_entries, 1);
        assert_eq!(index.stats().skipped_entries, 5);
        // one reference entry plus the international table
        assert_eq!(index.len(), 1 + INTERNATIONAL_COORDINATES.len());
    }

    #[test]
    fn test_index_first_reference_entry_wins() {
        let regions = vec![
            region("湖南省 长沙市", json!([112.94, 28.23])),
            region("湖南省 长沙市", json!([0.0, 0.0])),
        ];
        let index = CoordinateIndex::from_regions(&regions);
        assert_eq!(index.get("湖南省 长沙市"), Some([112.94, 28.23]));
        assert_eq!(index.stats().duplicate_keys, 1);
    }

    #[test]
    fn test_reference_data_shadows_international_table() {
        let regions = vec![region("俄罗斯 莫斯科", json!([37.0, 55.0]))];
        let index = CoordinateIndex::from_regions(&regions);
        assert_eq!(index.get("俄罗斯 莫斯科"), Some([37.0, 55.0]));
        assert_eq!(index.stats().international_entries, 0);
    }

    #[test]
    fn test_international_only_resolves_moscow() {
        let index = CoordinateIndex::international_only();
        let moscow = LocationDescriptor {
            country: Some("俄罗斯".into()),
            city: Some("莫斯科".into()),
            ..Default::default()
        };
        let r = index.resolve(&moscow);
        assert_eq!(r.coordinates, Some([37.6176, 55.7558]));
        assert_eq!(r.label, "俄罗斯 莫斯科");
    }

    #[test]
    fn test_regions_document_accepts_path_alias() {
        let doc: RegionsDocument = serde_json::from_str(
            r#"{ "regions": [ { "path": "湖南省 长沙市", "coordinates": [112.94, 28.23] } ] }"#,
        )
        .unwrap();
        let index = CoordinateIndex::from_regions(&doc.regions);
        assert!(index.get("湖南省 长沙市").is_some());
    }

    // ── key and label composition ────────────────────────────────────

    #[test]
    fn test_label_dedups_city_equal_to_province() {
        let d = domestic("北京", "北京", "");
        assert_eq!(format_label(&d), "北京");
        assert_eq!(lookup_key(&d).as_deref(), Some("北京"));
    }

    #[test]
    fn test_label_dedups_district_equal_to_city() {
        let d = domestic("湖南省", "长沙市", "长沙市");
        assert_eq!(format_label(&d), "湖南省 长沙市");
        assert_eq!(lookup_key(&d).as_deref(), Some("湖南省 长沙市"));
    }

    #[test]
    fn test_label_is_idempotent() {
        let d = domestic("陕西省", "延安市", "宝塔区");
        assert_eq!(format_label(&d), format_label(&d));
        assert_eq!(format_label(&d), "陕西省 延安市 宝塔区");
    }

    #[test]
    fn test_foreign_key_ignores_province_and_district() {
        let d = LocationDescriptor {
            country: Some("俄罗斯".into()),
            province: Some("莫斯科州".into()),
            city: Some("莫斯科".into()),
            district: Some("红场".into()),
            ..Default::default()
        };
        assert_eq!(lookup_key(&d).as_deref(), Some("俄罗斯 莫斯科"));
    }

    #[test]
    fn test_domestic_country_uses_province_path() {
        let mut d = domestic("湖南省", "长沙市", "");
        d.country = Some(DOMESTIC_COUNTRY.into());
        assert_eq!(lookup_key(&d).as_deref(), Some("湖南省 长沙市"));
    }

    #[test]
    fn test_empty_descriptor_label_placeholder() {
        let d = LocationDescriptor::default();
        assert_eq!(lookup_key(&d), None);
        assert_eq!(format_label(&d), UNKNOWN_LOCATION);
    }

    // ── resolution ───────────────────────────────────────────────────

    #[test]
    fn test_resolve_hit() {
        let index = sample_index();
        let r = index.resolve(&domestic("湖南省", "湘潭市", "韶山市"));
        assert_eq!(r.coordinates, Some([112.52, 27.92]));
        assert_eq!(r.label, "湖南省 湘潭市 韶山市");
        assert!(r.is_resolved());
    }

    #[test]
    fn test_direct_coordinates_take_precedence() {
        let index = sample_index();
        let mut d = domestic("湖南省", "长沙市", "");
        d.coordinates = Some(json!([100.0, 30.0]));
        let r = index.resolve(&d);
        assert_eq!(r.coordinates, Some([100.0, 30.0]));
        assert_eq!(r.label, "湖南省 长沙市");
        assert_eq!(r.key, None);
    }

    #[test]
    fn test_malformed_direct_coordinates_fall_back_to_lookup() {
        let index = sample_index();
        let mut d = domestic("湖南省", "长沙市", "");
        d.coordinates = Some(json!([100.0, 30.0, 5.0]));
        let r = index.resolve(&d);
        assert_eq!(r.coordinates, Some([112.94, 28.23]));
        assert_eq!(r.key.as_deref(), Some("湖南省 长沙市"));
    }

    #[test]
    fn test_unresolvable_descriptor_keeps_label() {
        let index = sample_index();
        let r = index.resolve(&domestic("江西省", "瑞金市", ""));
        assert_eq!(r.coordinates, None);
        assert_eq!(r.label, "江西省 瑞金市");
        assert_eq!(r.key.as_deref(), Some("江西省 瑞金市"));

        let r = index.resolve(&LocationDescriptor::default());
        assert_eq!(r.coordinates, None);
        assert!(!r.label.is_empty());
    }

    #[test]
    fn test_coord_key_format() {
        assert_eq!(coord_key(&[112.94, 28.23]), "112.94,28.23");
        assert_eq!(coord_key(&[113.0, 28.0]), "113,28");
    }
}
