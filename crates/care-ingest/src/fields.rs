//! Header-to-field mapping.
//!
//! Intake exports come from different templates, in Chinese and English,
//! with inconsistent spacing and punctuation. Each header is normalized and
//! looked up in a fixed alias table; headers that miss the table can still
//! map through Jaro-Winkler similarity against every alias.

use std::collections::BTreeSet;
use std::fmt;

use rapidfuzz::distance::jaro_winkler::similarity as jaro_similarity;
use serde::{Deserialize, Serialize};

/// Canonical record fields a column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    RecordKey,
    PatientName,
    IdNumber,
    Gender,
    BirthDate,
    NativePlace,
    Ethnicity,
    AdmissionDate,
    AdmissionTimestamp,
    ImportTimestamp,
    UpdatedAt,
    CreatedAt,
    Hospital,
    Diagnosis,
    Doctor,
    Symptoms,
    TreatmentProcess,
    FollowUpPlan,
    Address,
    FatherInfo,
    MotherInfo,
    OtherGuardian,
    Caregivers,
    FamilyEconomics,
    ImportOrder,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 25] = [
        Self::RecordKey,
        Self::PatientName,
        Self::IdNumber,
        Self::Gender,
        Self::BirthDate,
        Self::NativePlace,
        Self::Ethnicity,
        Self::AdmissionDate,
        Self::AdmissionTimestamp,
        Self::ImportTimestamp,
        Self::UpdatedAt,
        Self::CreatedAt,
        Self::Hospital,
        Self::Diagnosis,
        Self::Doctor,
        Self::Symptoms,
        Self::TreatmentProcess,
        Self::FollowUpPlan,
        Self::Address,
        Self::FatherInfo,
        Self::MotherInfo,
        Self::OtherGuardian,
        Self::Caregivers,
        Self::FamilyEconomics,
        Self::ImportOrder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecordKey => "record_key",
            Self::PatientName => "patient_name",
            Self::IdNumber => "id_number",
            Self::Gender => "gender",
            Self::BirthDate => "birth_date",
            Self::NativePlace => "native_place",
            Self::Ethnicity => "ethnicity",
            Self::AdmissionDate => "admission_date",
            Self::AdmissionTimestamp => "admission_timestamp",
            Self::ImportTimestamp => "import_timestamp",
            Self::UpdatedAt => "updated_at",
            Self::CreatedAt => "created_at",
            Self::Hospital => "hospital",
            Self::Diagnosis => "diagnosis",
            Self::Doctor => "doctor",
            Self::Symptoms => "symptoms",
            Self::TreatmentProcess => "treatment_process",
            Self::FollowUpPlan => "follow_up_plan",
            Self::Address => "address",
            Self::FatherInfo => "father_info",
            Self::MotherInfo => "mother_info",
            Self::OtherGuardian => "other_guardian",
            Self::Caregivers => "caregivers",
            Self::FamilyEconomics => "family_economics",
            Self::ImportOrder => "import_order",
        }
    }

    /// Header spellings recognized for this field, already normalized.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::RecordKey => &["recordkey", "patientkey", "档案号", "档案编号", "病案号", "编号"],
            Self::PatientName => &[
                "patientname",
                "name",
                "姓名",
                "患者姓名",
                "患儿姓名",
                "儿童姓名",
                "孩子姓名",
            ],
            Self::IdNumber => &[
                "idnumber",
                "idcard",
                "身份证号",
                "身份证号码",
                "身份证",
                "证件号码",
                "患儿身份证号",
            ],
            Self::Gender => &["gender", "sex", "性别"],
            Self::BirthDate => &["birthdate", "dateofbirth", "dob", "出生日期", "出生年月", "生日"],
            Self::NativePlace => &["nativeplace", "籍贯", "户籍", "户籍地"],
            Self::Ethnicity => &["ethnicity", "民族"],
            Self::AdmissionDate => &["admissiondate", "入院日期", "入院时间", "入住日期", "入住时间"],
            Self::AdmissionTimestamp => &["admissiontimestamp", "admissionat", "admittedat"],
            Self::ImportTimestamp => &["importtimestamp", "importedat", "导入时间"],
            Self::UpdatedAt => &["updatedat", "updatetime", "更新时间"],
            Self::CreatedAt => &["createdat", "createtime", "创建时间"],
            Self::Hospital => &["hospital", "医院", "就诊医院", "住院医院"],
            Self::Diagnosis => &["diagnosis", "诊断", "疾病诊断", "入院诊断", "病情诊断"],
            Self::Doctor => &["doctor", "attendingdoctor", "clinician", "主治医生", "主治医师", "医生"],
            Self::Symptoms => &["symptoms", "症状", "主要症状"],
            Self::TreatmentProcess => &[
                "treatmentprocess",
                "treatment",
                "治疗过程",
                "治疗经过",
                "治疗情况",
            ],
            Self::FollowUpPlan => &["followupplan", "followup", "后续计划", "后续治疗计划", "随访计划"],
            Self::Address => &["address", "homeaddress", "家庭住址", "家庭地址", "住址", "地址"],
            Self::FatherInfo => &["fatherinfo", "father", "父亲", "父亲信息", "父亲姓名电话"],
            Self::MotherInfo => &["motherinfo", "mother", "母亲", "母亲信息", "母亲姓名电话"],
            Self::OtherGuardian => &["otherguardian", "guardian", "其他监护人", "监护人"],
            Self::Caregivers => &["caregivers", "caregiver", "陪护人", "照护人", "看护人"],
            Self::FamilyEconomics => &[
                "familyeconomics",
                "familyeconomicstatus",
                "家庭经济情况",
                "家庭经济状况",
                "经济情况",
            ],
            Self::ImportOrder => &["importorder", "rowno", "序号", "行号"],
        }
    }

    /// Fields whose cells are parsed as timestamps.
    pub fn is_timestamp(&self) -> bool {
        matches!(
            self,
            Self::AdmissionTimestamp | Self::ImportTimestamp | Self::UpdatedAt | Self::CreatedAt
        )
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize header text for alias comparison.
///
/// Lowercases and drops whitespace, ASCII punctuation and the full-width
/// brackets and colons common in Chinese templates.
pub fn normalize_header(text: &str) -> String {
    text.trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| {
            !c.is_whitespace()
                && !c.is_ascii_punctuation()
                && !matches!(c, '（' | '）' | '：' | '【' | '】' | '、' | '，')
        })
        .flat_map(char::to_lowercase)
        .collect()
}

/// How a header was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Fuzzy,
}

/// One header mapped onto a canonical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderMatch {
    pub column: usize,
    pub header: String,
    pub field: CanonicalField,
    pub kind: MatchKind,
    pub score: f64,
}

/// Result of mapping a header row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderMapping {
    pub matches: Vec<HeaderMatch>,
    /// Headers that map to no field, or to a field already claimed.
    pub unmapped: Vec<String>,
}

impl HeaderMapping {
    /// Column index mapped to a field, if any.
    pub fn column_for(&self, field: CanonicalField) -> Option<usize> {
        self.matches
            .iter()
            .find(|m| m.field == field)
            .map(|m| m.column)
    }

    pub fn has_field(&self, field: CanonicalField) -> bool {
        self.column_for(field).is_some()
    }
}

/// Map headers onto canonical fields.
///
/// Exact alias matches are resolved first across all columns, so a fuzzy
/// guess never steals a field that another column names exactly. The
/// leftmost column wins when two headers name the same field.
pub fn map_headers(headers: &[String], fuzzy_threshold: Option<f64>) -> HeaderMapping {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
    let mut claimed: BTreeSet<CanonicalField> = BTreeSet::new();
    let mut assigned: Vec<Option<HeaderMatch>> = vec![None; headers.len()];

    for (column, text) in normalized.iter().enumerate() {
        if text.is_empty() {
            continue;
        }
        if let Some(field) = exact_field(text)
            && claimed.insert(field)
        {
            assigned[column] = Some(HeaderMatch {
                column,
                header: headers[column].clone(),
                field,
                kind: MatchKind::Exact,
                score: 1.0,
            });
        }
    }

    if let Some(threshold) = fuzzy_threshold {
        for (column, text) in normalized.iter().enumerate() {
            if assigned[column].is_some() || text.is_empty() {
                continue;
            }
            if let Some((field, score)) = best_fuzzy_field(text, &claimed)
                && score >= threshold
            {
                claimed.insert(field);
                tracing::debug!(header = %headers[column], %field, score, "fuzzy header match");
                assigned[column] = Some(HeaderMatch {
                    column,
                    header: headers[column].clone(),
                    field,
                    kind: MatchKind::Fuzzy,
                    score,
                });
            }
        }
    }

    let mut mapping = HeaderMapping::default();
    for (column, slot) in assigned.into_iter().enumerate() {
        match slot {
            Some(found) => mapping.matches.push(found),
            None => mapping.unmapped.push(headers[column].clone()),
        }
    }
    mapping
}

fn exact_field(normalized: &str) -> Option<CanonicalField> {
    CanonicalField::ALL
        .into_iter()
        .find(|field| field.aliases().contains(&normalized))
}

fn best_fuzzy_field(
    normalized: &str,
    claimed: &BTreeSet<CanonicalField>,
) -> Option<(CanonicalField, f64)> {
    let mut best: Option<(CanonicalField, f64)> = None;
    for field in CanonicalField::ALL {
        if claimed.contains(&field) {
            continue;
        }
        for alias in field.aliases() {
            let score = jaro_similarity(normalized.chars(), alias.chars());
            if best.is_none_or(|(_, current)| score > current) {
                best = Some((field, score));
            }
        }
    }
    best
}
