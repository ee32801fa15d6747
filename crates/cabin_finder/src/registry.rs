//! Known campsites, looked up by key from the command line.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use campground_scan::{
    AspNetEndpoints, AspNetGridSite, Campsite, CampsiteDescriptor, GridApiSite, Platform,
    TableCalendarSite,
};

/// A `CAMPSITE_INFO` argument: which campsite, and who to tell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampsiteInfo {
    /// Registry key
    pub key: String,
    /// Subscriber addresses
    pub emails: Vec<String>,
}

/// Parse `<KEY>:<EMAIL>[,<EMAIL>...]`. Empty entries in the email list are dropped.
pub fn parse_campsite_info(arg: &str) -> Result<CampsiteInfo> {
    let parts: Vec<&str> = arg.split(':').collect();
    let [key, emails] = parts.as_slice() else {
        bail!("Campsite Info \"{}\" is malformed", arg);
    };

    let key = key.trim();
    if key.is_empty() {
        bail!("Campsite Info \"{}\" has no campsite key", arg);
    }

    let emails: Vec<String> = emails
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect();
    if emails.is_empty() {
        bail!("Campsite Info \"{}\" has no email addresses", arg);
    }

    Ok(CampsiteInfo {
        key: key.to_string(),
        emails,
    })
}

/// Campsite descriptors by key
#[derive(Debug, Clone)]
pub struct Registry {
    descriptors: BTreeMap<String, CampsiteDescriptor>,
}

impl Registry {
    /// The built-in campsites
    pub fn builtin() -> Self {
        let descriptors = [
            ("SteepRavine", steep_ravine()),
            ("SteepRavineApi", steep_ravine_api()),
            ("RedwoodRegionalPark", redwood_regional_park()),
            ("BlackMountainLookout", black_mountain_lookout()),
        ]
        .into_iter()
        .map(|(key, descriptor)| (key.to_string(), descriptor))
        .collect();

        Self { descriptors }
    }

    /// Add or replace descriptors from a JSON object of key to descriptor
    pub fn extend_from_json(&mut self, json: &str) -> Result<usize> {
        let extra: BTreeMap<String, CampsiteDescriptor> =
            serde_json::from_str(json).context("Invalid campsites JSON")?;
        let count = extra.len();
        self.descriptors.extend(extra);
        Ok(count)
    }

    /// Load extra descriptors from a JSON file
    pub fn extend_from_file(&mut self, path: &Path) -> Result<usize> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        self.extend_from_json(&json)
            .with_context(|| format!("Failed to load campsites from {}", path.display()))
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }

    /// Look up and validate a campsite
    pub fn campsite(&self, key: &str) -> Result<Campsite> {
        let Some(descriptor) = self.descriptors.get(key) else {
            bail!(
                "{} is not a known campsite (known: {})",
                key,
                self.keys().collect::<Vec<_>>().join(", ")
            );
        };
        Campsite::try_from(descriptor.clone()).with_context(|| format!("Campsite {} is invalid", key))
    }
}

fn steep_ravine_site() -> AspNetGridSite {
    AspNetGridSite {
        place_id: "682".to_string(),
        place_name: "Mount Tamalpais SP".to_string(),
        facility_id: "766".to_string(),
        facility_type: "0".to_string(),
        endpoints: AspNetEndpoints::default(),
    }
}

fn steep_ravine() -> CampsiteDescriptor {
    CampsiteDescriptor {
        name: "Steep Ravine".to_string(),
        site_filter: "CB.*".to_string(),
        platform: Platform::AspNetGrid(steep_ravine_site()),
    }
}

fn steep_ravine_api() -> CampsiteDescriptor {
    CampsiteDescriptor {
        name: "Steep Ravine".to_string(),
        site_filter: "CB.*".to_string(),
        platform: Platform::GridApi(GridApiSite::new("766")),
    }
}

fn redwood_regional_park() -> CampsiteDescriptor {
    CampsiteDescriptor {
        name: "Redwood Regional Park".to_string(),
        site_filter: ".*".to_string(),
        platform: Platform::TableCalendar(TableCalendarSite::new(
            "https://www.reserveamerica.com/camping/redwood-regional-park/r/campgroundDetails.do?contractCode=EB&parkId=110458",
            &[
                ("contractCode", "EB"),
                ("parkId", "110458"),
                (
                    "contractDefaultMaxWindow",
                    "MS:24,LT:18,GA:24,SC:13,PA:24,LARC:24,CTLN:13,LA:13,PRCG:13",
                ),
                (
                    "stateDefaultMaxWindow",
                    "MS:24,GA:24,PA:24,CO:24,CA:13,LA:13,TX:13,FL:13,WA:13,NY:13,SC:13,WI:13,MA:13,ME:13,OH:13,GA:13,ID:13,MI:13,CA:13,UT:13,MN:13,MO:13,WY:13,OR:13,IL:13,IN:13,MS:13,MT:13,VA:13,AL:13,CO:13,KY:13,CT:13,PA:13,AR:13,LA:13,NC:13,NE:13,TN:13,NJ:13,NM:13",
                ),
            ],
        )),
    }
}

fn black_mountain_lookout() -> CampsiteDescriptor {
    CampsiteDescriptor {
        name: "Black Mountain Lookout".to_string(),
        site_filter: ".*".to_string(),
        platform: Platform::TableCalendar(TableCalendarSite::new(
            "https://www.reserveamerica.com/camping/black-mountain-lookout/r/campgroundDetails.do?contractCode=NRSO&parkId=72306",
            &[
                ("contractCode", "NRSO"),
                ("parkId", "72306"),
                ("contractDefaultMaxWindow", "MS:24,LT:18,GA:24,SC:13"),
                ("stateDefaultMaxWindow", "MS:24,GA:24,SC:13"),
            ],
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_campsite_info() {
        let info = parse_campsite_info("SteepRavine:a@example.com,,b@example.com").unwrap();
        assert_eq!(info.key, "SteepRavine");
        assert_eq!(info.emails, vec!["a@example.com", "b@example.com"]);
    }

    #[test]
    fn test_malformed_campsite_info() {
        assert!(parse_campsite_info("SteepRavine").is_err());
        assert!(parse_campsite_info("a:b:c").is_err());
        assert!(parse_campsite_info(":a@example.com").is_err());
        assert!(parse_campsite_info("SteepRavine:,").is_err());
    }

    #[test]
    fn test_builtin_campsites_validate() {
        let registry = Registry::builtin();
        for key in registry.keys() {
            let campsite = registry.campsite(key).unwrap();
            assert!(!campsite.name.is_empty());
        }
        assert_eq!(
            registry.campsite("SteepRavine").unwrap().platform.kind(),
            "asp_net_grid"
        );
    }

    #[test]
    fn test_unknown_key_lists_known_ones() {
        let err = Registry::builtin().campsite("Yosemite").unwrap_err();
        assert!(err.to_string().contains("SteepRavine"));
    }

    #[test]
    fn test_extend_from_json() {
        let mut registry = Registry::builtin();
        let added = registry
            .extend_from_json(
                r#"{
                    "Pinnacles": {
                        "name": "Pinnacles",
                        "site_filter": "A.*",
                        "platform": "grid_api",
                        "facility_id": "123"
                    }
                }"#,
            )
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(
            registry.campsite("Pinnacles").unwrap().platform.kind(),
            "grid_api"
        );
    }

    #[test]
    fn test_invalid_json_descriptor_fails_lookup() {
        let mut registry = Registry::builtin();
        registry
            .extend_from_json(
                r#"{"Broken": {"name": "", "site_filter": "A.*", "platform": "grid_api", "facility_id": "1"}}"#,
            )
            .unwrap();
        assert!(registry.campsite("Broken").is_err());
    }
}
