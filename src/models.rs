use serde::Serialize;

#[derive(Serialize, Clone)]
pub struct Professor {
    pub professor_id: String,
    pub full_name: String,
    pub department: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbProfessor {
    pub professor_id: Option<String>,
    pub full_name: Option<String>,
    pub department: Option<String>,
}

impl From<DbProfessor> for Professor {
    fn from(professor: DbProfessor) -> Self {
        Self {
            professor_id: professor.professor_id.unwrap_or_default(),
            full_name: professor.full_name.unwrap_or_default(),
            department: professor.department.unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Clone)]
pub struct Student {
    pub student_id: String,
    pub full_name: String,
    pub course: String,
    pub year_level: String,
    pub section: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbStudent {
    pub student_id: Option<String>,
    pub full_name: Option<String>,
    pub course: Option<String>,
    pub year_level: Option<String>,
    pub section: Option<String>,
}

impl From<DbStudent> for Student {
    fn from(student: DbStudent) -> Self {
        Self {
            student_id: student.student_id.unwrap_or_default(),
            full_name: student.full_name.unwrap_or_default(),
            course: student.course.unwrap_or_default(),
            year_level: student.year_level.unwrap_or_default(),
            section: student.section.unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Clone)]
pub struct Subject {
    pub subject_code: String,
    pub description: String,
    pub units: i64,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbSubject {
    pub subject_code: Option<String>,
    pub description: Option<String>,
    pub units: Option<i64>,
}

impl From<DbSubject> for Subject {
    fn from(subject: DbSubject) -> Self {
        Self {
            subject_code: subject.subject_code.unwrap_or_default(),
            description: subject.description.unwrap_or_default(),
            units: subject.units.unwrap_or_default(),
        }
    }
}

/// One offering of a subject by a professor in a term.
#[derive(Serialize, Clone)]
pub struct Assignment {
    pub id: i64,
    pub professor_id: String,
    pub subject_code: String,
    pub section: String,
    pub school_year: String,
    pub semester: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbAssignment {
    pub id: Option<i64>,
    pub professor_id: Option<String>,
    pub subject_code: Option<String>,
    pub section: Option<String>,
    pub school_year: Option<String>,
    pub semester: Option<String>,
}

impl From<DbAssignment> for Assignment {
    fn from(assignment: DbAssignment) -> Self {
        Self {
            id: assignment.id.unwrap_or_default(),
            professor_id: assignment.professor_id.unwrap_or_default(),
            subject_code: assignment.subject_code.unwrap_or_default(),
            section: assignment.section.unwrap_or_default(),
            school_year: assignment.school_year.unwrap_or_default(),
            semester: assignment.semester.unwrap_or_default(),
        }
    }
}

/// Assignment joined with professor and subject names, for the admin listing.
#[derive(Serialize, Clone)]
pub struct AssignmentDetail {
    pub id: i64,
    pub professor_id: String,
    pub professor_name: String,
    pub subject_code: String,
    pub subject_description: String,
    pub section: String,
    pub school_year: String,
    pub semester: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbAssignmentDetail {
    pub id: Option<i64>,
    pub professor_id: Option<String>,
    pub professor_name: Option<String>,
    pub subject_code: Option<String>,
    pub subject_description: Option<String>,
    pub section: Option<String>,
    pub school_year: Option<String>,
    pub semester: Option<String>,
}

impl From<DbAssignmentDetail> for AssignmentDetail {
    fn from(detail: DbAssignmentDetail) -> Self {
        Self {
            id: detail.id.unwrap_or_default(),
            professor_id: detail.professor_id.unwrap_or_default(),
            professor_name: detail.professor_name.unwrap_or_default(),
            subject_code: detail.subject_code.unwrap_or_default(),
            subject_description: detail.subject_description.unwrap_or_default(),
            section: detail.section.unwrap_or_default(),
            school_year: detail.school_year.unwrap_or_default(),
            semester: detail.semester.unwrap_or_default(),
        }
    }
}

/// Assignment row as seen from the professor dashboard.
#[derive(Serialize, Clone)]
pub struct AssignedSubject {
    pub subject_code: String,
    pub description: String,
    pub section: String,
    pub school_year: String,
    pub semester: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbAssignedSubject {
    pub subject_code: Option<String>,
    pub description: Option<String>,
    pub section: Option<String>,
    pub school_year: Option<String>,
    pub semester: Option<String>,
}

impl From<DbAssignedSubject> for AssignedSubject {
    fn from(subject: DbAssignedSubject) -> Self {
        Self {
            subject_code: subject.subject_code.unwrap_or_default(),
            description: subject.description.unwrap_or_default(),
            section: subject.section.unwrap_or_default(),
            school_year: subject.school_year.unwrap_or_default(),
            semester: subject.semester.unwrap_or_default(),
        }
    }
}

/// A student's registration record in one assignment. Grade fields stay
/// nullable until the professor records them.
#[derive(Serialize, Clone)]
pub struct Enrollment {
    pub id: i64,
    pub student_id: String,
    pub prof_subject_id: i64,
    pub midterm_grade: Option<f64>,
    pub final_grade: Option<f64>,
    pub remarks: Option<String>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbEnrollment {
    pub id: Option<i64>,
    pub student_id: Option<String>,
    pub prof_subject_id: Option<i64>,
    pub midterm_grade: Option<f64>,
    pub final_grade: Option<f64>,
    pub remarks: Option<String>,
}

impl From<DbEnrollment> for Enrollment {
    fn from(enrollment: DbEnrollment) -> Self {
        Self {
            id: enrollment.id.unwrap_or_default(),
            student_id: enrollment.student_id.unwrap_or_default(),
            prof_subject_id: enrollment.prof_subject_id.unwrap_or_default(),
            midterm_grade: enrollment.midterm_grade,
            final_grade: enrollment.final_grade,
            remarks: enrollment.remarks,
        }
    }
}

/// Enrollment joined with student and offering details, for the professor's
/// class roster.
#[derive(Serialize, Clone)]
pub struct RosterRow {
    pub enrollment_id: i64,
    pub student_id: String,
    pub full_name: String,
    pub subject_code: String,
    pub description: String,
    pub section: String,
    pub school_year: String,
    pub semester: String,
    pub midterm_grade: Option<f64>,
    pub final_grade: Option<f64>,
    pub remarks: Option<String>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbRosterRow {
    pub enrollment_id: Option<i64>,
    pub student_id: Option<String>,
    pub full_name: Option<String>,
    pub subject_code: Option<String>,
    pub description: Option<String>,
    pub section: Option<String>,
    pub school_year: Option<String>,
    pub semester: Option<String>,
    pub midterm_grade: Option<f64>,
    pub final_grade: Option<f64>,
    pub remarks: Option<String>,
}

impl From<DbRosterRow> for RosterRow {
    fn from(row: DbRosterRow) -> Self {
        Self {
            enrollment_id: row.enrollment_id.unwrap_or_default(),
            student_id: row.student_id.unwrap_or_default(),
            full_name: row.full_name.unwrap_or_default(),
            subject_code: row.subject_code.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
            section: row.section.unwrap_or_default(),
            school_year: row.school_year.unwrap_or_default(),
            semester: row.semester.unwrap_or_default(),
            midterm_grade: row.midterm_grade,
            final_grade: row.final_grade,
            remarks: row.remarks,
        }
    }
}

/// Grade row as seen from the student dashboard, with instructor and
/// offering details joined in.
#[derive(Serialize, Clone)]
pub struct GradeRow {
    pub student_id: String,
    pub full_name: String,
    pub subject_code: String,
    pub description: String,
    pub instructor: String,
    pub units: i64,
    pub midterm_grade: Option<f64>,
    pub final_grade: Option<f64>,
    pub remarks: Option<String>,
    pub section: String,
    pub school_year: String,
    pub semester: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbGradeRow {
    pub student_id: Option<String>,
    pub full_name: Option<String>,
    pub subject_code: Option<String>,
    pub description: Option<String>,
    pub instructor: Option<String>,
    pub units: Option<i64>,
    pub midterm_grade: Option<f64>,
    pub final_grade: Option<f64>,
    pub remarks: Option<String>,
    pub section: Option<String>,
    pub school_year: Option<String>,
    pub semester: Option<String>,
}

impl From<DbGradeRow> for GradeRow {
    fn from(row: DbGradeRow) -> Self {
        Self {
            student_id: row.student_id.unwrap_or_default(),
            full_name: row.full_name.unwrap_or_default(),
            subject_code: row.subject_code.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
            instructor: row.instructor.unwrap_or_default(),
            units: row.units.unwrap_or_default(),
            midterm_grade: row.midterm_grade,
            final_grade: row.final_grade,
            remarks: row.remarks,
            section: row.section.unwrap_or_default(),
            school_year: row.school_year.unwrap_or_default(),
            semester: row.semester.unwrap_or_default(),
        }
    }
}

/// Account listing row for the admin dashboard. Admin accounts are excluded
/// from the listing, so full_name always resolves through a profile table.
#[derive(Serialize, Clone)]
pub struct AccountRow {
    pub username: String,
    pub full_name: String,
    pub role: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbAccountRow {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<String>,
}

impl From<DbAccountRow> for AccountRow {
    fn from(row: DbAccountRow) -> Self {
        Self {
            username: row.username.unwrap_or_default(),
            full_name: row.full_name.unwrap_or_default(),
            role: row.role.unwrap_or_default(),
        }
    }
}
