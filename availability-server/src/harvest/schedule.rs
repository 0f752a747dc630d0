use serde::{Deserialize, Serialize};

/// One published month for a facility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// `M/YYYY`; entries without a valid month are skipped.
    #[serde(default)]
    pub month_year: Option<String>,
    #[serde(default)]
    pub excel_url: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
}

/// A facility and its published timetable documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilitySchedule {
    #[serde(default)]
    pub did_number: Option<String>,
    pub lcsd_number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub jogging_schedule: Vec<ScheduleEntry>,
}

/// Body of a harvest request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestRequest {
    #[serde(default)]
    pub facilities: Vec<FacilitySchedule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_published_schedule() {
        let json = r#"{
            "facilities": [{
                "did_number": "D-7",
                "lcsd_number": "1060a",
                "name": "Victoria Park",
                "jogging_schedule": [
                    {"month_year": "7/2025", "excel_url": "https://example.org/7.xlsx", "pdf_url": "https://example.org/7.pdf"},
                    {"month_year": "8/2025", "pdf_url": "https://example.org/8.pdf"}
                ]
            }, {
                "lcsd_number": "42"
            }]
        }"#;
        let req: HarvestRequest = serde_json::from_str(json).unwrap();

        assert_eq!(req.facilities.len(), 2);
        let first = &req.facilities[0];
        assert_eq!(first.jogging_schedule.len(), 2);
        assert_eq!(first.jogging_schedule[1].excel_url, None);
        assert!(req.facilities[1].jogging_schedule.is_empty());
        assert_eq!(req.facilities[1].name, "");
    }
}
