use crate::{
    auth::{DbUser, DbUserSession, User, UserSession},
    error::AppError,
};
use chrono::{NaiveDateTime, Utc};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::models::{
    AccountRow, AssignedSubject, Assignment, AssignmentDetail, DbAccountRow, DbAssignedSubject,
    DbAssignment, DbAssignmentDetail, DbEnrollment, DbGradeRow, DbProfessor, DbRosterRow,
    DbStudent, DbSubject, Enrollment, GradeRow, Professor, RosterRow, Student, Subject,
};

#[instrument]
pub async fn get_user(pool: &Pool<Sqlite>, username: &str) -> Result<User, AppError> {
    info!("Fetching user by username");
    let row = sqlx::query_as::<_, DbUser>("SELECT username, role FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(user) => Ok(User::from(user)),
        _ => Err(AppError::NotFound(format!(
            "User {} not found in database",
            username
        ))),
    }
}

#[instrument(skip_all, fields(username, role))]
pub async fn authenticate_user(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
    role: &str,
) -> Result<Option<User>, AppError> {
    info!("Authenticating user");
    let row = sqlx::query_as::<_, (String, String, String)>(
        "SELECT username, password, role FROM users WHERE username = ? AND role = ?",
    )
    .bind(username)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    match row {
        Some((username, stored_hash, role)) => match bcrypt::verify(password, &stored_hash) {
            Ok(true) => Ok(Some(User::from(DbUser {
                username: Some(username),
                role: Some(role),
            }))),
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}

#[instrument(skip_all, fields(username, role))]
pub async fn create_user(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
    role: &str,
) -> Result<(), AppError> {
    info!("Creating new user");

    let existing: Option<(String,)> =
        sqlx::query_as("SELECT username FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;

    if existing.is_some() {
        return Err(AppError::Validation(format!(
            "Username '{}' already exists",
            username
        )));
    }

    let hashed_password = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

    sqlx::query("INSERT INTO users (username, password, role) VALUES (?, ?, ?)")
        .bind(username)
        .bind(hashed_password)
        .bind(role)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip_all, fields(username))]
pub async fn update_user_password(
    pool: &Pool<Sqlite>,
    username: &str,
    new_password: &str,
) -> Result<(), AppError> {
    info!("Updating user password");
    let hashed_password = bcrypt::hash(new_password, bcrypt::DEFAULT_COST)?;

    sqlx::query("UPDATE users SET password = ? WHERE username = ?")
        .bind(hashed_password)
        .bind(username)
        .execute(pool)
        .await?;

    Ok(())
}

/// Creates the bootstrap admin account if no admin exists yet. No API route
/// can create an admin, so a fresh database gets one from the environment.
#[instrument(skip_all)]
pub async fn ensure_admin_account(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
) -> Result<bool, AppError> {
    let existing: Option<(String,)> =
        sqlx::query_as("SELECT username FROM users WHERE role = 'admin' LIMIT 1")
            .fetch_optional(pool)
            .await?;

    if existing.is_some() {
        return Ok(false);
    }

    info!(username = %username, "Seeding bootstrap admin account");
    create_user(pool, username, password, "admin").await?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Account provisioning
// ---------------------------------------------------------------------------

/// User row and professor profile are created together; a failing profile
/// insert rolls back the account insert.
#[instrument(skip_all, fields(username))]
pub async fn create_professor_account(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
    full_name: &str,
    department: &str,
) -> Result<(), AppError> {
    info!("Creating professor account");

    let existing: Option<(String,)> =
        sqlx::query_as("SELECT username FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;

    if existing.is_some() {
        return Err(AppError::Validation(format!(
            "Username '{}' already exists",
            username
        )));
    }

    let hashed_password = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO users (username, password, role) VALUES (?, ?, 'professor')")
        .bind(username)
        .bind(hashed_password)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO professors (professor_id, full_name, department) VALUES (?, ?, ?)")
        .bind(username)
        .bind(full_name)
        .bind(department)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

#[instrument(skip_all, fields(student_id))]
pub async fn create_student_account(
    pool: &Pool<Sqlite>,
    student_id: &str,
    password: &str,
    full_name: &str,
    course: &str,
    year_level: &str,
    section: &str,
) -> Result<(), AppError> {
    info!("Creating student account");

    let existing: Option<(String,)> =
        sqlx::query_as("SELECT username FROM users WHERE username = ?")
            .bind(student_id)
            .fetch_optional(pool)
            .await?;

    if existing.is_some() {
        return Err(AppError::Validation(format!(
            "Username '{}' already exists",
            student_id
        )));
    }

    let hashed_password = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO users (username, password, role) VALUES (?, ?, 'student')")
        .bind(student_id)
        .bind(hashed_password)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO students (student_id, full_name, course, year_level, section)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(student_id)
    .bind(full_name)
    .bind(course)
    .bind(year_level)
    .bind(section)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(())
}

#[instrument]
pub async fn get_professor(
    pool: &Pool<Sqlite>,
    professor_id: &str,
) -> Result<Option<Professor>, AppError> {
    info!("Fetching professor profile");
    let row = sqlx::query_as::<_, DbProfessor>(
        "SELECT professor_id, full_name, department FROM professors WHERE professor_id = ?",
    )
    .bind(professor_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Professor::from))
}

#[instrument]
pub async fn get_student(
    pool: &Pool<Sqlite>,
    student_id: &str,
) -> Result<Option<Student>, AppError> {
    info!("Fetching student profile");
    let row = sqlx::query_as::<_, DbStudent>(
        "SELECT student_id, full_name, course, year_level, section
         FROM students WHERE student_id = ?",
    )
    .bind(student_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Student::from))
}

#[instrument]
pub async fn update_professor(
    pool: &Pool<Sqlite>,
    professor_id: &str,
    full_name: &str,
    department: &str,
) -> Result<(), AppError> {
    info!("Updating professor profile");
    sqlx::query("UPDATE professors SET full_name = ?, department = ? WHERE professor_id = ?")
        .bind(full_name)
        .bind(department)
        .bind(professor_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument]
pub async fn update_student(
    pool: &Pool<Sqlite>,
    student_id: &str,
    full_name: &str,
    course: &str,
    year_level: &str,
    section: &str,
) -> Result<(), AppError> {
    info!("Updating student profile");
    sqlx::query(
        "UPDATE students SET full_name = ?, course = ?, year_level = ?, section = ?
         WHERE student_id = ?",
    )
    .bind(full_name)
    .bind(course)
    .bind(year_level)
    .bind(section)
    .bind(student_id)
    .execute(pool)
    .await?;

    Ok(())
}

#[instrument]
pub async fn list_accounts(pool: &Pool<Sqlite>) -> Result<Vec<AccountRow>, AppError> {
    info!("Listing professor and student accounts");
    let rows = sqlx::query_as::<_, DbAccountRow>(
        "SELECT u.username, u.role,
                CASE
                  WHEN u.role = 'professor' THEN p.full_name
                  WHEN u.role = 'student' THEN s.full_name
                  ELSE 'N/A'
                END AS full_name
         FROM users u
         LEFT JOIN professors p ON u.username = p.professor_id AND u.role = 'professor'
         LEFT JOIN students s ON u.username = s.student_id AND u.role = 'student'
         WHERE u.role IN ('professor', 'student')
         ORDER BY u.role, u.username",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(AccountRow::from).collect())
}

/// Cascading delete for a professor account: enrollments under the
/// professor's assignments, then the assignments, then the profile row,
/// then sessions, then the account row. One transaction, so a failing step
/// rolls back the whole chain.
#[instrument]
pub async fn delete_professor_account(
    pool: &Pool<Sqlite>,
    professor_id: &str,
) -> Result<(), AppError> {
    info!("Deleting professor account");

    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM enrollments WHERE prof_subject_id IN
           (SELECT id FROM professor_subjects WHERE professor_id = ?)",
    )
    .bind(professor_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM professor_subjects WHERE professor_id = ?")
        .bind(professor_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM professors WHERE professor_id = ?")
        .bind(professor_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM user_sessions WHERE username = ?")
        .bind(professor_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM users WHERE username = ? AND role = 'professor'")
        .bind(professor_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

#[instrument]
pub async fn delete_student_account(
    pool: &Pool<Sqlite>,
    student_id: &str,
) -> Result<(), AppError> {
    info!("Deleting student account");

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM enrollments WHERE student_id = ?")
        .bind(student_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM students WHERE student_id = ?")
        .bind(student_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM user_sessions WHERE username = ?")
        .bind(student_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM users WHERE username = ? AND role = 'student'")
        .bind(student_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Subjects
// ---------------------------------------------------------------------------

#[instrument]
pub async fn list_subjects(pool: &Pool<Sqlite>) -> Result<Vec<Subject>, AppError> {
    info!("Listing subjects");
    let rows = sqlx::query_as::<_, DbSubject>(
        "SELECT subject_code, description, units FROM subjects ORDER BY subject_code",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Subject::from).collect())
}

#[instrument]
pub async fn create_subject(
    pool: &Pool<Sqlite>,
    subject_code: &str,
    description: &str,
    units: i64,
) -> Result<(), AppError> {
    info!("Creating subject");
    sqlx::query("INSERT INTO subjects (subject_code, description, units) VALUES (?, ?, ?)")
        .bind(subject_code)
        .bind(description)
        .bind(units)
        .execute(pool)
        .await?;

    Ok(())
}

/// Cascading delete for a subject: enrollments referencing any offering of
/// the subject, then the offerings, then the subject row.
#[instrument]
pub async fn delete_subject(pool: &Pool<Sqlite>, subject_code: &str) -> Result<(), AppError> {
    info!("Deleting subject");

    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM enrollments WHERE prof_subject_id IN
           (SELECT id FROM professor_subjects WHERE subject_code = ?)",
    )
    .bind(subject_code)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM professor_subjects WHERE subject_code = ?")
        .bind(subject_code)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM subjects WHERE subject_code = ?")
        .bind(subject_code)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Assignments
// ---------------------------------------------------------------------------

#[instrument]
pub async fn create_assignment(
    pool: &Pool<Sqlite>,
    professor_id: &str,
    subject_code: &str,
    section: &str,
    school_year: &str,
    semester: &str,
) -> Result<i64, AppError> {
    info!("Assigning professor to subject");
    let res = sqlx::query(
        "INSERT INTO professor_subjects (professor_id, subject_code, section, school_year, semester)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(professor_id)
    .bind(subject_code)
    .bind(section)
    .bind(school_year)
    .bind(semester)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument]
pub async fn list_assignments(pool: &Pool<Sqlite>) -> Result<Vec<AssignmentDetail>, AppError> {
    info!("Listing assignments");
    let rows = sqlx::query_as::<_, DbAssignmentDetail>(
        "SELECT ps.id, ps.professor_id, p.full_name AS professor_name,
                ps.subject_code, s.description AS subject_description,
                ps.section, ps.school_year, ps.semester
         FROM professor_subjects ps
         JOIN professors p ON ps.professor_id = p.professor_id
         JOIN subjects s ON ps.subject_code = s.subject_code
         ORDER BY p.full_name, ps.subject_code",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(AssignmentDetail::from).collect())
}

#[instrument]
pub async fn get_assignment(pool: &Pool<Sqlite>, id: i64) -> Result<Assignment, AppError> {
    info!("Fetching assignment");
    let row = sqlx::query_as::<_, DbAssignment>(
        "SELECT id, professor_id, subject_code, section, school_year, semester
         FROM professor_subjects WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(assignment) => Ok(Assignment::from(assignment)),
        _ => Err(AppError::NotFound(format!(
            "Assignment with id {} not found in database",
            id
        ))),
    }
}

/// Resolves (subject_code, professor_id) to an assignment id. An empty
/// result is not an error: the caller signals "not found" as `{}`.
#[instrument]
pub async fn find_assignment(
    pool: &Pool<Sqlite>,
    subject_code: &str,
    professor_id: &str,
) -> Result<Option<i64>, AppError> {
    info!("Looking up assignment by subject and professor");
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT id FROM professor_subjects WHERE subject_code = ? AND professor_id = ?",
    )
    .bind(subject_code)
    .bind(professor_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id,)| id))
}

#[instrument]
pub async fn get_assignments_for_professor(
    pool: &Pool<Sqlite>,
    professor_id: &str,
) -> Result<Vec<AssignedSubject>, AppError> {
    info!("Fetching assigned subjects for professor");
    let rows = sqlx::query_as::<_, DbAssignedSubject>(
        "SELECT ps.subject_code, s.description, ps.section, ps.school_year, ps.semester
         FROM professor_subjects ps
         JOIN subjects s ON ps.subject_code = s.subject_code
         WHERE ps.professor_id = ?",
    )
    .bind(professor_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(AssignedSubject::from).collect())
}

/// Cascading delete for one offering: dependent enrollments first.
#[instrument]
pub async fn delete_assignment(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting assignment");

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM enrollments WHERE prof_subject_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM professor_subjects WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Enrollments and grades
// ---------------------------------------------------------------------------

#[instrument]
pub async fn enroll_student(
    pool: &Pool<Sqlite>,
    student_id: &str,
    prof_subject_id: i64,
) -> Result<i64, AppError> {
    info!("Enrolling student into assignment");
    let res = sqlx::query("INSERT INTO enrollments (student_id, prof_subject_id) VALUES (?, ?)")
        .bind(student_id)
        .bind(prof_subject_id)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument]
pub async fn get_enrollment(pool: &Pool<Sqlite>, id: i64) -> Result<Enrollment, AppError> {
    info!("Fetching enrollment");
    let row = sqlx::query_as::<_, DbEnrollment>(
        "SELECT id, student_id, prof_subject_id, midterm_grade, final_grade, remarks
         FROM enrollments WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(enrollment) => Ok(Enrollment::from(enrollment)),
        _ => Err(AppError::NotFound(format!(
            "Enrollment with id {} not found in database",
            id
        ))),
    }
}

/// Overwrites all three grade fields unconditionally; an absent field
/// becomes NULL.
#[instrument(skip(pool))]
pub async fn update_grades(
    pool: &Pool<Sqlite>,
    enrollment_id: i64,
    midterm_grade: Option<f64>,
    final_grade: Option<f64>,
    remarks: Option<&str>,
) -> Result<(), AppError> {
    info!("Updating grades");
    sqlx::query(
        "UPDATE enrollments SET midterm_grade = ?, final_grade = ?, remarks = ? WHERE id = ?",
    )
    .bind(midterm_grade)
    .bind(final_grade)
    .bind(remarks)
    .bind(enrollment_id)
    .execute(pool)
    .await?;

    Ok(())
}

#[instrument]
pub async fn delete_enrollment(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting enrollment");
    sqlx::query("DELETE FROM enrollments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument]
pub async fn get_roster_for_professor(
    pool: &Pool<Sqlite>,
    professor_id: &str,
) -> Result<Vec<RosterRow>, AppError> {
    info!("Fetching class roster for professor");
    let rows = sqlx::query_as::<_, DbRosterRow>(
        "SELECT e.id AS enrollment_id, st.student_id, st.full_name,
                subj.subject_code, subj.description,
                ps.section, ps.school_year, ps.semester,
                e.midterm_grade, e.final_grade, e.remarks
         FROM enrollments e
         JOIN students st ON e.student_id = st.student_id
         JOIN professor_subjects ps ON e.prof_subject_id = ps.id
         JOIN subjects subj ON ps.subject_code = subj.subject_code
         WHERE ps.professor_id = ?",
    )
    .bind(professor_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(RosterRow::from).collect())
}

#[instrument]
pub async fn get_grades_for_student(
    pool: &Pool<Sqlite>,
    student_id: &str,
) -> Result<Vec<GradeRow>, AppError> {
    info!("Fetching grades for student");
    let rows = sqlx::query_as::<_, DbGradeRow>(
        "SELECT st.student_id, st.full_name, subj.subject_code, subj.description,
                p.full_name AS instructor, subj.units,
                e.midterm_grade, e.final_grade, e.remarks,
                ps.section, ps.school_year, ps.semester
         FROM enrollments e
         JOIN students st ON e.student_id = st.student_id
         JOIN professor_subjects ps ON e.prof_subject_id = ps.id
         JOIN professors p ON ps.professor_id = p.professor_id
         JOIN subjects subj ON ps.subject_code = subj.subject_code
         WHERE st.student_id = ?",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(GradeRow::from).collect())
}

#[instrument]
pub async fn find_students_by_id(
    pool: &Pool<Sqlite>,
    student_id: &str,
) -> Result<Vec<Student>, AppError> {
    info!("Searching students by id");
    let rows = sqlx::query_as::<_, DbStudent>(
        "SELECT student_id, full_name, course, year_level, section
         FROM students WHERE student_id = ?",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Student::from).collect())
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[instrument(skip(pool, token))]
pub async fn create_user_session(
    pool: &Pool<Sqlite>,
    username: &str,
    token: &str,
    expires_at: NaiveDateTime,
) -> Result<i64, AppError> {
    info!("Creating user session");

    let res = sqlx::query("INSERT INTO user_sessions (username, token, expires_at) VALUES (?, ?, ?)")
        .bind(username)
        .bind(token)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool, token))]
pub async fn get_session_by_token(
    pool: &Pool<Sqlite>,
    token: &str,
) -> Result<UserSession, AppError> {
    info!("Getting session by token");

    let session = sqlx::query_as::<_, DbUserSession>(
        "SELECT id, username, token, created_at, expires_at FROM user_sessions WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    match session {
        Some(session) => Ok(UserSession::from(session)),
        _ => Err(AppError::Authentication(
            "Invalid session token".to_string(),
        )),
    }
}

#[instrument(skip(pool, token))]
pub async fn invalidate_session(pool: &Pool<Sqlite>, token: &str) -> Result<(), AppError> {
    info!("Invalidating session");

    sqlx::query("DELETE FROM user_sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn clean_expired_sessions(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
    info!("Cleaning expired sessions");

    let now = Utc::now().naive_utc();

    let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at < ?")
        .bind(now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
