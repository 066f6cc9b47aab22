use serde::Serialize;

/// Student head-count split by sex, for the dashboard chart.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SexBreakdown {
    pub male: u64,
    pub female: u64,
}

/// Dashboard widget data: per-role user counts and the student sex split.
#[derive(Serialize, utoipa::ToSchema)]
pub struct OverviewResponse {
    pub admins: u64,
    pub teachers: u64,
    pub students: u64,
    pub parents: u64,
    pub student_sex: SexBreakdown,
}
