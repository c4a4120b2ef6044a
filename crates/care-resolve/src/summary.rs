//! Summary projection.

use care_model::{PatientGroup, PatientSummary};

/// Flatten a finalized group into its read-model shape.
pub fn project_summary(group: &PatientGroup) -> PatientSummary {
    let admission = &group.admission;
    PatientSummary {
        key: group.key.clone(),
        patient_name: group.patient_name.clone(),
        gender: group.gender.clone(),
        birth_date: group.birth_date.clone(),
        native_place: group.native_place.clone(),
        ethnicity: group.ethnicity.clone(),
        id_number: group.id_number.clone(),
        admission_count: admission.count,
        member_count: group.member_count(),
        first_admission_at: admission.first_admission_at,
        first_diagnosis: admission.first_diagnosis.clone(),
        first_hospital: admission.first_hospital.clone(),
        latest_admission_at: admission.latest_admission_at,
        latest_diagnosis: admission.latest_diagnosis.clone(),
        latest_hospital: admission.latest_hospital.clone(),
        latest_doctor: admission.latest_doctor.clone(),
        caregivers: group.caregivers.clone(),
        family_contacts: group.family_contacts.clone(),
        address: group.address.clone(),
        family_economics: group.family_economics.clone(),
    }
}

pub fn project_summaries<'a>(
    groups: impl IntoIterator<Item = &'a PatientGroup>,
) -> Vec<PatientSummary> {
    groups.into_iter().map(project_summary).collect()
}

#[cfg(test)]
mod tests {
    use care_model::{GroupKeySource, RawRecord};

    use super::*;

    #[test]
    fn projection_copies_rollup_and_counts() {
        let mut group = PatientGroup::new("110101199001011234", GroupKeySource::IdNumber);
        group.patient_name = "张三".to_string();
        group.admission.count = 1;
        group.admission.latest_doctor = "李医生".to_string();
        group.records = vec![RawRecord::named("张三"), RawRecord::named("张 三")];

        let summary = project_summary(&group);

        assert_eq!(summary.key, "110101199001011234");
        assert_eq!(summary.admission_count, 1);
        assert_eq!(summary.member_count, 2);
        assert_eq!(summary.latest_doctor, "李医生");
    }

    #[test]
    fn summary_has_no_working_indices() {
        let group = PatientGroup::new("k", GroupKeySource::RecordKey);
        let json = serde_json::to_value(project_summary(&group)).unwrap();
        assert!(json.get("indices").is_none());
        assert!(json.get("records").is_none());
    }
}
