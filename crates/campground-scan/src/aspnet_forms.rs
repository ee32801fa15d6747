//! Form bodies for the two ASP.NET postbacks. Most fields are fixed
//! values the site expects to see echoed back; only the view-state, the
//! place, the facility and the arrival date vary.

use chrono::NaiveDate;

use crate::campsite::AspNetGridSite;
use crate::date_format::DateFormat;

/// Hidden fields a page hands out for the next postback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    /// `__VIEWSTATE`
    pub view_state: String,
    /// `__VIEWSTATEGENERATOR`
    pub generator: String,
}

const HOME_DEFAULTS: &[(&str, &str)] = &[
    ("__EVENTTARGET", ""),
    ("__EVENTARGUMENT", ""),
    ("ctl00$ctl00$hdnLoginCaptchResponse", ""),
    ("ctl00$ctl00$Hidscreenresolutionmain", ""),
    ("ctl00$ctl00$hdnCulture", ""),
    ("g-recaptcha-response", ""),
    ("ctl00$ctl00$txtCaptcha", ""),
    ("ctl00$ctl00$AdvanceMainSearch$hdnLat", "37.17159"),
    ("ctl00$ctl00$AdvanceMainSearch$hdnLag", "122.22203"),
    ("ctl00$ctl00$AdvanceMainSearch$hdnautocomplete", ""),
    ("ctl00$ctl00$AdvanceMainSearch$hdnNights", "0"),
    ("ctl00$ctl00$AdvanceMainSearch$ddlNights", "0"),
    ("ctl00$ctl00$AdvanceMainSearch$hdnEnableGoogleAnalyticCodeTracing", ""),
    ("ctl00$ctl00$mainContent$indexValue", ""),
    ("ctl00$ctl00$mainContent$ddlFacilityCategory", "1"),
    ("ctl00$ctl00$mainContent$hdnparksize", "Medium"),
    ("ctl00$ctl00$mainContent$hdnScreenresolution", "728"),
    ("ctl00$ctl00$mainContent$hdndefaultLat", "37.88904571533203"),
    ("ctl00$ctl00$mainContent$hdndefaultLag", "122.61078643798828"),
    ("ctl00$ctl00$mainContent$hdnIsAutocompleteFillHome", "1"),
    ("ctl00$ctl00$mainContent$hdnSearchtype", "Park"),
    ("ctl00$ctl00$mainContent$ddlHomeNights", "1"),
    ("ctl00$ctl00$mainContent$ddl_homeCategories", "0"),
    ("ctl00$ctl00$mainContent$ddl_homeCampingUnit", "0"),
    ("ctl00$ctl00$mainContent$ddl_homeLength", "0"),
    ("ctl00$ctl00$mainContent$hdnHomeUnitTypeCategory", ""),
    ("ctl00$ctl00$mainContent$TextBox1", ""),
    ("ctl00$ctl00$mainContent$TextBox2", ""),
    ("ctl00$ctl00$mainContent$btnSearch", "Go"),
    ("ctl00$ctl00$mainContent$homeContent$indexValue", ""),
];

const AVAILABILITY_DEFAULTS: &[(&str, &str)] = &[
    ("__EVENTTARGET", ""),
    ("__EVENTARGUMENT", ""),
    ("ctl01$hdnLoginCaptchResponse", ""),
    ("ctl01$Hidscreenresolutionmain", ""),
    ("ctl01$hdnCulture", ""),
    ("g-recaptcha-response", ""),
    ("ctl01$txtCaptcha", ""),
    ("ctl01$AdvanceMainSearch$hdnAutoPlaceId", ""),
    ("ctl01$AdvanceMainSearch$hdnLat", "37.88904571533203"),
    ("ctl01$AdvanceMainSearch$hdnLag", "122.61078643798828"),
    ("ctl01$AdvanceMainSearch$hdnautocomplete", ""),
    ("ctl01$AdvanceMainSearch$hdncustomautocomplete", ""),
    ("ctl01$AdvanceMainSearch$hdnNights", "0"),
    ("ctl01$AdvanceMainSearch$ddlNights", "0"),
    ("ctl01$AdvanceMainSearch$hdnEnableGoogleAnalyticCodeTracing", ""),
    ("ctl01$mainContent$btngetFacilitiess", "Hure"),
    ("ctl01$mainContent$hdClient", ""),
    ("ctl01$mainContent$Hidscreenresolution", ""),
    ("ctl01$mainContent$hiddenPlaceLevel", ""),
    ("ctl01$mainContent$facilityChanged", ""),
    ("ctl01$mainContent$IsParkFeatures", "0"),
    ("ctl01$mainContent$hdnParkFirstBlockFullDesc", ""),
    ("ctl01$mainContent$hdnInventoryUpdateClick", "1"),
    ("ctl01$mainContent$SearchUnitAvailbity$hdnNightsSearchUnitAvailbity", "1"),
    ("ctl01$mainContent$SearchUnitAvailbity$hdnSearchtypeSearchUnitAvailbity", ""),
    ("ctl01$mainContent$SearchUnitAvailbity$hdnParkSizeSearchUnitAvailbity", ""),
    ("ctl01$mainContent$SearchUnitAvailbity$hdnSearchPlaceIdSearchUnitAvailbity", ""),
    ("ctl01$mainContent$SearchUnitAvailbity$hdnAutoPlaceIdSearchUnitAvailbity", ""),
    ("ctl01$mainContent$SearchUnitAvailbity$hdnLatSearchUnitAvailbity", "37.88904571533203"),
    ("ctl01$mainContent$SearchUnitAvailbity$hdnLagSearchUnitAvailbity", "122.61078643798828"),
    ("ctl01$mainContent$SearchUnitAvailbity$hdnautocompleteSearchUnitAvailbity", ""),
    ("ctl01$mainContent$SearchUnitAvailbity$hdncustomautocompleteSearchUnitAvailbity", ""),
    ("ctl01$mainContent$SearchUnitAvailbity$hdnIsPremiumSearchUnitAvailbity", ""),
    ("ctl01$mainContent$SearchUnitAvailbity$hdnIsAdaSearchUnitAvailbity", "0"),
    ("ctl01$mainContent$SearchUnitAvailbity$hdnIsPlaceSearchUnitAvailbity", "0"),
    ("ctl01$mainContent$SearchUnitAvailbity$hdnIsFacilityBacktoSearchUnitPlace", "0"),
    ("ctl01$mainContent$SearchUnitAvailbity$hdnParkFinderArray", ""),
    ("ctl01$mainContent$SearchUnitAvailbity$hdnIsAutocompleteFill", "1"),
    ("ctl01$mainContent$SearchUnitAvailbity$hdn_NewCampingUnitSearchUnitAvailbity", "0"),
    ("ctl01$mainContent$SearchUnitAvailbity$hdn_IsParkAllData", "false"),
    ("ctl01$mainContent$SearchUnitAvailbity$ddlNightsSearchUnitAvailbity", "1"),
    ("ctl01$mainContent$SearchUnitAvailabilityforPlace$hdn_CategoriesSearchUnitAvailbity", "0"),
    ("ctl01$mainContent$SearchUnitAvailabilityforPlace$hdn_CampingUnitSearchUnitAvailbity", "0"),
    ("ctl01$mainContent$SearchUnitAvailabilityforPlace$hdn_LengthSearchUnitAvailbity", "0"),
    ("ctl01$mainContent$SearchUnitAvailabilityforPlace$hdn_SelectCampingEquipSearchUnitAvailbity", ""),
    ("ctl01$mainContent$SearchUnitAvailabilityforPlace$hdnddlLenghtSearchUnitAvailbity", "0"),
    ("ctl01$mainContent$SearchUnitAvailabilityforPlace$hdnLeft_placeidSearchUnitAvailbity", ""),
    ("ctl01$mainContent$SearchUnitAvailabilityforPlace$ddl_Categories", "0"),
    ("ctl01$mainContent$SearchUnitAvailabilityforPlace$ddl_CampingUnit", "0"),
    ("ctl01$mainContent$SearchUnitAvailabilityforPlace$ddl_Length", "0"),
    ("ctl01$mainContent$SearchUnitAvailabilityforPlace$hdnPlaceUnitTypeCategory", ""),
    ("ctl01$mainContent$facilitySearch$hdn_CategoriesSearchFacilityUnitAvailbity", "0"),
    ("ctl01$mainContent$facilitySearch$hdn_CampingUnitFacilitySearchUnitAvailbity", "0"),
    ("ctl01$mainContent$facilitySearch$hdn_LengthSearchUnitFacilityAvailbity", "0"),
    ("ctl01$mainContent$facilitySearch$hdnIsAdaSearchUnitfacility", "0"),
    ("ctl01$mainContent$facilitySearch$ddl_Categories_facility", "0"),
    ("ctl01$mainContent$facilitySearch$ddl_CampingUnit_facility", "0"),
    ("ctl01$mainContent$facilitySearch$ddl_Length_facility", "0"),
    ("ctl01$mainContent$facilitySearch$hdnFacilityUnitTypeCategory", ""),
    ("ctl01$mainContent$ugReservationGrid$hdnSelectedUnits", ""),
    ("ctl01$mainContent$ugReservationGrid$hdnnotavailableunit", ""),
    ("ctl01$mainContent$ugReservationGrid$hdnnotavailableunitAdvanced", ""),
];

fn with_defaults<'a>(
    state: &ViewState,
    defaults: &[(&'a str, &'a str)],
    fields: Vec<(&'a str, &'a str)>,
) -> Vec<(String, String)> {
    let mut params = vec![
        ("__VIEWSTATE".to_string(), state.view_state.clone()),
        ("__VIEWSTATEGENERATOR".to_string(), state.generator.clone()),
    ];
    params.extend(
        fields
            .into_iter()
            .chain(defaults.iter().copied())
            .map(|(k, v)| (k.to_string(), v.to_string())),
    );
    params
}

/// Park search postback on the home page, priming the session's place context
pub fn home_search_form(
    site: &AspNetGridSite,
    state: &ViewState,
    arrival: NaiveDate,
) -> Vec<(String, String)> {
    let arrival = DateFormat::Slash.format(arrival);
    let arrival = arrival.as_str();
    let place_id = site.place_id.as_str();
    let place_name = site.place_name.as_str();

    with_defaults(
        state,
        HOME_DEFAULTS,
        vec![
            ("ctl00$ctl00$AdvanceMainSearch$hdnAutoPlaceId", place_id),
            ("ctl00$ctl00$mainContent$hdnsearchplaceid", place_id),
            ("ctl00$ctl00$mainContent$hdnMasterPlaceId", place_id),
            ("ctl00$ctl00$AdvanceMainSearch$hdncustomautocomplete", place_name),
            ("ctl00$ctl00$mainContent$hdnSearchPlaceName", place_name),
            ("ctl00$ctl00$mainContent$txtSearchparkautocomplete", place_name),
            ("ctl00$ctl00$mainContent$txtSearchparkautocompletehearst", place_name),
            ("ctl00$ctl00$mainContent$txtSearchparkautocompleteother", place_name),
            ("ctl00$ctl00$AdvanceMainSearch$hdnArrivalDate", arrival),
            ("ctl00$ctl00$AdvanceMainSearch$txtArrivalDate", arrival),
            ("ctl00$ctl00$mainContent$txtArrivalDate", arrival),
        ],
    )
}

/// Facility availability postback whose response carries the grid
pub fn availability_form(
    site: &AspNetGridSite,
    state: &ViewState,
    arrival: NaiveDate,
) -> Vec<(String, String)> {
    let arrival = DateFormat::Slash.format(arrival);
    let arrival = arrival.as_str();

    with_defaults(
        state,
        AVAILABILITY_DEFAULTS,
        vec![
            ("ctl01$AdvanceMainSearch$hdnArrivalDate", arrival),
            ("ctl01$AdvanceMainSearch$txtArrivalDate", arrival),
            ("ctl01$mainContent$SearchUnitAvailbity$txtArrivalDate", arrival),
            (
                "ctl01$mainContent$SearchUnitAvailabilityforPlace$hdnArrivalDateSearchUnitAvailbity",
                arrival,
            ),
            ("ctl01$mainContent$txtDateRange", arrival),
            ("ctl01$mainContent$hdnPlaceid", site.place_id.as_str()),
            (
                "ctl01$mainContent$SearchUnitAvailbity$txtCityParkSearch",
                site.place_name.as_str(),
            ),
            ("ctl01$mainContent$hdnFacilityid", site.facility_id.as_str()),
            ("ctl01$mainContent$hdnFacilityType", site.facility_type.as_str()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campsite::AspNetEndpoints;
    use crate::session_manager::testing::field;

    fn site() -> AspNetGridSite {
        AspNetGridSite {
            place_id: "682".to_string(),
            place_name: "Mount Tamalpais SP".to_string(),
            facility_id: "766".to_string(),
            facility_type: "0".to_string(),
            endpoints: AspNetEndpoints::default(),
        }
    }

    fn state() -> ViewState {
        ViewState {
            view_state: "vs-token".to_string(),
            generator: "gen-token".to_string(),
        }
    }

    #[test]
    fn test_home_form_carries_place_and_tokens() {
        let arrival = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let params = home_search_form(&site(), &state(), arrival);

        assert_eq!(field(&params, "__VIEWSTATE"), Some("vs-token"));
        assert_eq!(field(&params, "__VIEWSTATEGENERATOR"), Some("gen-token"));
        assert_eq!(
            field(&params, "ctl00$ctl00$mainContent$hdnMasterPlaceId"),
            Some("682")
        );
        assert_eq!(
            field(&params, "ctl00$ctl00$mainContent$txtArrivalDate"),
            Some("03/01/2024")
        );
        assert_eq!(field(&params, "ctl00$ctl00$mainContent$btnSearch"), Some("Go"));
    }

    #[test]
    fn test_availability_form_carries_facility() {
        let arrival = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        let params = availability_form(&site(), &state(), arrival);

        assert_eq!(field(&params, "ctl01$mainContent$hdnFacilityid"), Some("766"));
        assert_eq!(field(&params, "ctl01$mainContent$hdnFacilityType"), Some("0"));
        assert_eq!(
            field(&params, "ctl01$mainContent$txtDateRange"),
            Some("12/25/2024")
        );
        assert_eq!(
            field(&params, "ctl01$mainContent$btngetFacilitiess"),
            Some("Hure")
        );
    }
}
