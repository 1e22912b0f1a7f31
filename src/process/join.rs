use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::process::{
    cbsa::{AreaType, CbsaName},
    county::CountyName,
    crosswalk::ZipArea,
};

/// Output header, in file order.
pub const OUTPUT_COLUMNS: [&str; 6] = [
    "zipcode",
    "FIPS",
    "CountyName",
    "cbsacode",
    "cbsatitle",
    "metromicro",
];

/// One line of the finished crosswalk. `None` is written as an empty cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrosswalkRow {
    #[serde(rename = "zipcode")]
    pub zipcode: String,
    #[serde(rename = "FIPS")]
    pub fips: Option<String>,
    #[serde(rename = "CountyName")]
    pub county_name: Option<String>,
    #[serde(rename = "cbsacode")]
    pub cbsa_code: Option<String>,
    #[serde(rename = "cbsatitle")]
    pub cbsa_title: Option<String>,
    #[serde(rename = "metromicro")]
    pub metro_micro: Option<AreaType>,
}

/// ZIP → county with the county's name attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipCounty {
    pub zip: String,
    pub fips: String,
    pub county_name: Option<String>,
}

/// A ZIP after combining both crosswalks; either side may be absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipRecord {
    pub zip: String,
    pub fips: Option<String>,
    pub county_name: Option<String>,
    pub cbsa_code: Option<String>,
}

fn index_by<'a, T, F>(items: &'a [T], key: F) -> HashMap<&'a str, Vec<&'a T>>
where
    F: Fn(&'a T) -> &'a str,
{
    let mut map: HashMap<&str, Vec<&T>> = HashMap::with_capacity(items.len());
    for item in items {
        map.entry(key(item)).or_default().push(item);
    }
    map
}

/// Left join on FIPS. Every ZIP survives; a FIPS listed twice in `names`
/// yields two rows.
pub fn attach_county_names(zip_counties: &[ZipArea], names: &[CountyName]) -> Vec<ZipCounty> {
    let by_fips = index_by(names, |n| n.fips.as_str());
    let mut out = Vec::with_capacity(zip_counties.len());
    for zc in zip_counties {
        match by_fips.get(zc.code.as_str()) {
            Some(matches) => out.extend(matches.iter().map(|n| ZipCounty {
                zip: zc.zip.clone(),
                fips: zc.code.clone(),
                county_name: Some(n.name.clone()),
            })),
            None => out.push(ZipCounty {
                zip: zc.zip.clone(),
                fips: zc.code.clone(),
                county_name: None,
            }),
        }
    }
    out
}

/// Full outer join on ZIP, ordered by ZIP.
///
/// ZIPs found on only one side keep empty values for the other side.
pub fn outer_join_on_zip(counties: &[ZipCounty], cbsas: &[ZipArea]) -> Vec<ZipRecord> {
    let mut keys: BTreeMap<&str, (Vec<&ZipCounty>, Vec<&ZipArea>)> = BTreeMap::new();
    for c in counties {
        keys.entry(c.zip.as_str()).or_default().0.push(c);
    }
    for z in cbsas {
        keys.entry(z.zip.as_str()).or_default().1.push(z);
    }

    let mut out = Vec::with_capacity(keys.len());
    for (zip, (left, right)) in keys {
        match (left.is_empty(), right.is_empty()) {
            (false, false) => {
                for l in &left {
                    for r in &right {
                        out.push(ZipRecord {
                            zip: zip.to_string(),
                            fips: Some(l.fips.clone()),
                            county_name: l.county_name.clone(),
                            cbsa_code: Some(r.code.clone()),
                        });
                    }
                }
            }
            (false, true) => out.extend(left.iter().map(|l| ZipRecord {
                zip: zip.to_string(),
                fips: Some(l.fips.clone()),
                county_name: l.county_name.clone(),
                cbsa_code: None,
            })),
            (true, false) => out.extend(right.iter().map(|r| ZipRecord {
                zip: zip.to_string(),
                fips: None,
                county_name: None,
                cbsa_code: Some(r.code.clone()),
            })),
            (true, true) => {}
        }
    }
    out
}

/// Left join `cbsa_code` against the delineation metro code.
pub fn attach_cbsa_names(records: &[ZipRecord], names: &[CbsaName]) -> Vec<CrosswalkRow> {
    let by_metro = index_by(names, |n| n.metro_code.as_str());
    let mut out = Vec::with_capacity(records.len());
    for rec in records {
        let matches = rec
            .cbsa_code
            .as_deref()
            .and_then(|code| by_metro.get(code));
        let base = CrosswalkRow {
            zipcode: rec.zip.clone(),
            fips: rec.fips.clone(),
            county_name: rec.county_name.clone(),
            cbsa_code: rec.cbsa_code.clone(),
            cbsa_title: None,
            metro_micro: None,
        };
        match matches {
            Some(names) => out.extend(names.iter().map(|n| CrosswalkRow {
                cbsa_title: Some(n.title.clone()),
                metro_micro: Some(n.area_type.clone()),
                ..base.clone()
            })),
            None => out.push(base),
        }
    }
    out
}

/// Stable sort by CBSA title (byte order); rows without a title go last.
pub fn sort_by_title(rows: &mut [CrosswalkRow]) {
    rows.sort_by(|a, b| match (&a.cbsa_title, &b.cbsa_title) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// Join the four normalised tables into the sorted output rows.
pub fn build_crosswalk(
    zip_counties: &[ZipArea],
    county_names: &[CountyName],
    zip_cbsas: &[ZipArea],
    cbsa_names: &[CbsaName],
) -> Vec<CrosswalkRow> {
    let with_names = attach_county_names(zip_counties, county_names);
    let combined = outer_join_on_zip(&with_names, zip_cbsas);
    let mut rows = attach_cbsa_names(&combined, cbsa_names);
    sort_by_title(&mut rows);
    debug!(rows = rows.len(), "joined crosswalk");
    rows
}

/// Counts logged after each run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrosswalkSummary {
    pub rows: usize,
    pub without_county: usize,
    pub without_county_name: usize,
    pub without_cbsa: usize,
    pub without_cbsa_title: usize,
}

impl CrosswalkSummary {
    pub fn from_rows(rows: &[CrosswalkRow]) -> Self {
        let mut s = Self {
            rows: rows.len(),
            ..Self::default()
        };
        for r in rows {
            s.without_county += r.fips.is_none() as usize;
            s.without_county_name += r.county_name.is_none() as usize;
            s.without_cbsa += r.cbsa_code.is_none() as usize;
            s.without_cbsa_title += r.cbsa_title.is_none() as usize;
        }
        s
    }
}
