//! Closed vocabularies shared by the API and the storage layer.
//!
//! Every enum serializes as its variant name on the wire (`"WorkInProgress"`)
//! and is stored in SQLite as the same text via `strum`.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Kind of a work item. Issues and deliverables carry a subtype payload.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum WorkItemType {
    Task,
    Deliverable,
    Issue,
}

impl WorkItemType {
    pub fn label(self) -> &'static str {
        match self {
            WorkItemType::Task => "Task",
            WorkItemType::Deliverable => "Deliverable",
            WorkItemType::Issue => "Issue",
        }
    }
}

/// Lifecycle of a work item.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum Status {
    ToDo,
    WorkInProgress,
    UnderReview,
    Completed,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::ToDo => "To Do",
            Status::WorkInProgress => "Work In Progress",
            Status::UnderReview => "Under Review",
            Status::Completed => "Completed",
        }
    }

    pub fn is_open(self) -> bool {
        self != Status::Completed
    }
}

/// Priority, most urgent first.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
    Backlog,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Urgent => "Urgent",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::Backlog => "Backlog",
        }
    }
}

/// Release state of a part number.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum PartState {
    Released,
    UnderReview,
    InWork,
    Implementation,
}

impl PartState {
    pub fn label(self) -> &'static str {
        match self {
            PartState::Released => "Released",
            PartState::UnderReview => "Under Review",
            PartState::InWork => "In Work",
            PartState::Implementation => "Implementation",
        }
    }
}

/// Classification of an issue work item.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum IssueType {
    Defect,
    Failure,
    RequirementWaiver,
    NonConformanceReportNCR,
    ProcessManufacturingIssue,
    SupplyChainProcurementIssue,
    IntegrationInterfaceIssue,
    TestVerificationAnomaly,
    EnvironmentalReliabilityIssue,
    ConfigurationDocumentationControlIssue,
    SafetyRegulatoryIssue,
    ProgrammaticRiskItem,
    ObsolescenceEndOfLifeIssue,
    Other,
}

impl IssueType {
    pub fn label(self) -> &'static str {
        match self {
            IssueType::Defect => "Defect",
            IssueType::Failure => "Failure",
            IssueType::RequirementWaiver => "Requirement Waiver",
            IssueType::NonConformanceReportNCR => "Non-Conformance Report (NCR)",
            IssueType::ProcessManufacturingIssue => "Process / Manufacturing Issue",
            IssueType::SupplyChainProcurementIssue => "Supply Chain / Procurement Issue",
            IssueType::IntegrationInterfaceIssue => "Integration / Interface Issue",
            IssueType::TestVerificationAnomaly => "Test / Verification Anomaly",
            IssueType::EnvironmentalReliabilityIssue => "Environmental / Reliability Issue",
            IssueType::ConfigurationDocumentationControlIssue => {
                "Configuration / Documentation Control Issue"
            }
            IssueType::SafetyRegulatoryIssue => "Safety / Regulatory Issue",
            IssueType::ProgrammaticRiskItem => "Programmatic Risk Item",
            IssueType::ObsolescenceEndOfLifeIssue => "Obsolescence / End-of-Life Issue",
            IssueType::Other => "Other",
        }
    }
}

/// Engineering document or artifact a deliverable work item produces.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum DeliverableType {
    SystemSubsystemRequirementsSpecificationSRS,
    InterfaceControlDocumentICD,
    PreliminaryDesignReviewPDRPackage,
    RiskFailureModeEffectsAnalysisFMEADFMEAReport,
    DevelopmentVerificationPlanVVMatrix,
    EngineeringDrawingCADModel,
    BillofMaterialsBOM,
    StressStructuralAnalysisReport,
    ThermalAnalysisReport,
    ElectricalSchematicsPCBLayouts,
    DesignforManufacturabilityDFMDesignforTestDFTReviewReport,
    CriticalDesignReviewCDRPackage,
    WorkInstructionsAssemblyProcedures,
    FirstArticleInspectionFAIReport,
    SupplierQualityRecordsCertificatesofConformanceCoC,
    TestPlansandProcedures,
    QualificationTestReport,
    AcceptanceTestProcedureATPReport,
    CalibrationCertificates,
    NonConformanceCorrectiveActionReportNCRCAR,
    RequirementsVerificationReport,
    AsBuiltConfigurationEndItemDataPackage,
    UserOperationsManual,
    MaintenanceRepairManualSparePartsList,
    CertificatesofCompliance,
    LessonsLearnedPostProjectReport,
    Other,
}

impl DeliverableType {
    pub fn label(self) -> &'static str {
        use DeliverableType::*;
        match self {
            SystemSubsystemRequirementsSpecificationSRS => {
                "System/Subsystem Requirements Specification (SRS)"
            }
            InterfaceControlDocumentICD => "Interface Control Document (ICD)",
            PreliminaryDesignReviewPDRPackage => "Preliminary Design Review (PDR) Package",
            RiskFailureModeEffectsAnalysisFMEADFMEAReport => {
                "Risk / Failure Mode & Effects Analysis (FMEA/DFMEA) Report"
            }
            DevelopmentVerificationPlanVVMatrix => "Development & Verification Plan (V&V Matrix)",
            EngineeringDrawingCADModel => "Engineering Drawing & CAD Model",
            BillofMaterialsBOM => "Bill of Materials (BOM)",
            StressStructuralAnalysisReport => "Stress / Structural Analysis Report",
            ThermalAnalysisReport => "Thermal Analysis Report",
            ElectricalSchematicsPCBLayouts => "Electrical Schematics & PCB Layouts",
            DesignforManufacturabilityDFMDesignforTestDFTReviewReport => {
                "Design for Manufacturability (DFM) & Design for Test (DFT) Review Report"
            }
            CriticalDesignReviewCDRPackage => "Critical Design Review (CDR) Package",
            WorkInstructionsAssemblyProcedures => "Work Instructions & Assembly Procedures",
            FirstArticleInspectionFAIReport => "First Article Inspection (FAI) Report",
            SupplierQualityRecordsCertificatesofConformanceCoC => {
                "Supplier Quality Records & Certificates of Conformance (CoC)"
            }
            TestPlansandProcedures => "Test Plans and Procedures",
            QualificationTestReport => "Qualification Test Report",
            AcceptanceTestProcedureATPReport => "Acceptance Test Procedure (ATP) & Report",
            CalibrationCertificates => "Calibration Certificates",
            NonConformanceCorrectiveActionReportNCRCAR => {
                "Non-Conformance & Corrective Action Report (NCR/CAR)"
            }
            RequirementsVerificationReport => "Requirements Verification Report",
            AsBuiltConfigurationEndItemDataPackage => {
                "As-Built Configuration / End-Item Data Package"
            }
            UserOperationsManual => "User / Operations Manual",
            MaintenanceRepairManualSparePartsList => "Maintenance & Repair Manual / Spare Parts List",
            CertificatesofCompliance => "Certificates of Compliance",
            LessonsLearnedPostProjectReport => "Lessons Learned & Post-Project Report",
            Other => "Other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn storage_text_matches_wire_text() {
        for status in Status::iter() {
            let wire = serde_json::to_value(status).unwrap();
            assert_eq!(wire, serde_json::Value::String(status.to_string()));
            assert_eq!(Status::from_str(status.as_ref()).ok(), Some(status));
        }
        for kind in DeliverableType::iter() {
            let wire = serde_json::to_value(kind).unwrap();
            assert_eq!(wire, serde_json::Value::String(kind.to_string()));
        }
    }

    #[test]
    fn unknown_spelling_is_rejected() {
        assert!(Status::from_str("Done").is_err());
        assert!(serde_json::from_str::<Priority>("\"Critical\"").is_err());
        assert!(serde_json::from_str::<IssueType>("\"defect\"").is_err());
    }

    #[test]
    fn vocabulary_sizes() {
        assert_eq!(IssueType::iter().count(), 14);
        assert_eq!(DeliverableType::iter().count(), 27);
        assert_eq!(Priority::iter().count(), 5);
    }

    #[test]
    fn labels_are_human_readable() {
        assert_eq!(Status::WorkInProgress.label(), "Work In Progress");
        assert_eq!(
            IssueType::NonConformanceReportNCR.label(),
            "Non-Conformance Report (NCR)"
        );
        assert_eq!(PartState::InWork.label(), "In Work");
        assert_eq!(Priority::Backlog.label(), "Backlog");
    }

    #[test]
    fn only_completed_is_closed() {
        let open: Vec<Status> = Status::iter().filter(|s| s.is_open()).collect();
        assert_eq!(
            open,
            vec![Status::ToDo, Status::WorkInProgress, Status::UnderReview]
        );
    }
}
