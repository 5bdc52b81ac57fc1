use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Permission, User, UserSession};
use crate::db::{
    authenticate_user, create_assignment, create_professor_account,
    create_student_account, create_subject, create_user_session, delete_assignment,
    delete_enrollment, delete_professor_account, delete_student_account, delete_subject,
    enroll_student, find_assignment, find_students_by_id, get_assignment,
    get_assignments_for_professor, get_grades_for_student, get_professor,
    get_roster_for_professor, get_student, invalidate_session, list_accounts, list_assignments,
    list_subjects, update_grades, update_professor, update_student, update_user_password,
};
use crate::models::{AccountRow, AssignedSubject, AssignmentDetail, GradeRow, RosterRow, Student, Subject};
use crate::validation::AppErrorExt;
use crate::validation::JsonValidateExt;
use crate::validation::PermissionCheckExt;
use crate::validation::ValidationResponse;

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Role is required"))]
    role: String,
    #[validate(length(min = 1, message = "Username is required"))]
    username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}

#[derive(Serialize, Deserialize)]
pub struct ProfessorProfile {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: String,
    pub name: String,
    pub course: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professor: Option<ProfessorProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<StudentProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LoginResponse {
    fn failure(message: &str) -> Self {
        Self {
            success: false,
            professor: None,
            student: None,
            role: None,
            user_id: None,
            message: Some(message.to_string()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UserData {
    pub username: String,
    pub role: String,
}

impl From<User> for UserData {
    fn from(user: User) -> Self {
        Self {
            username: user.username.clone(),
            role: user.role.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

#[post("/login", data = "<login>")]
pub async fn api_login(
    login: Json<LoginRequest>,
    cookies: &rocket::http::CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<LoginResponse>, Custom<Json<ValidationResponse>>> {
    use chrono::Utc;
    use rocket::http::{Cookie, SameSite};

    let validated = login.validate_custom()?;

    let user = match authenticate_user(db, &validated.username, &validated.password, &validated.role)
        .await
        .validate_custom()?
    {
        Some(user) => user,
        None => return Ok(Json(LoginResponse::failure("Invalid credentials"))),
    };

    // Resolve the role-specific profile before issuing a session: an account
    // without its profile row cannot use any dashboard.
    let mut response = LoginResponse {
        success: true,
        professor: None,
        student: None,
        role: None,
        user_id: None,
        message: None,
    };

    match validated.role.as_str() {
        "professor" => match get_professor(db, &user.username).await.validate_custom()? {
            Some(professor) => {
                response.professor = Some(ProfessorProfile {
                    id: professor.professor_id,
                    name: professor.full_name,
                });
            }
            None => return Ok(Json(LoginResponse::failure("Professor data not found"))),
        },
        "student" => match get_student(db, &user.username).await.validate_custom()? {
            Some(student) => {
                response.student = Some(StudentProfile {
                    id: student.student_id,
                    name: student.full_name,
                    course: student.course,
                });
            }
            None => return Ok(Json(LoginResponse::failure("Student data not found"))),
        },
        _ => {
            response.role = Some(user.role.to_string());
            response.user_id = Some(user.username.clone());
        }
    }

    let token = UserSession::generate_token();
    let expires_at = Utc::now() + chrono::Duration::hours(1);

    create_user_session(db, &user.username, &token, expires_at.naive_utc())
        .await
        .validate_custom()?;

    let cookie = Cookie::build(("session_token", token))
        .same_site(SameSite::Lax)
        .http_only(true)
        .max_age(rocket::time::Duration::hours(1));
    cookies.add_private(cookie);

    cookies.add_private(
        Cookie::build(("user_id", user.username.clone()))
            .same_site(SameSite::Lax)
            .http_only(true)
            .max_age(rocket::time::Duration::hours(1)),
    );

    cookies.add_private(
        Cookie::build(("user_role", user.role.to_string()))
            .same_site(SameSite::Lax)
            .max_age(rocket::time::Duration::hours(1)),
    );

    Ok(Json(response))
}

#[get("/me")]
pub async fn api_me(user: User) -> Json<UserData> {
    Json(UserData::from(user))
}

#[get("/me", rank = 2)]
pub async fn api_me_unauthorized() -> Status {
    Status::Unauthorized
}

#[post("/logout")]
pub async fn api_logout(
    cookies: &rocket::http::CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
) -> Json<MessageResponse> {
    let token = cookies
        .get_private("session_token")
        .map(|cookie| cookie.value().to_string());

    if let Some(token) = token {
        let _ = invalidate_session(db, &token).await;
    }

    cookies.remove_private(rocket::http::Cookie::build("session_token"));
    cookies.remove_private(rocket::http::Cookie::build("user_id"));
    cookies.remove_private(rocket::http::Cookie::build("user_role"));

    MessageResponse::new("Logged out successfully!")
}

#[derive(Deserialize, Validate)]
pub struct PasswordChangeRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    current_password: String,
    #[validate(length(min = 1, message = "New password is required"))]
    new_password: String,
}

#[post("/change-password", data = "<password>")]
pub async fn api_change_password(
    password: Json<PasswordChangeRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Custom<Json<ValidationResponse>>> {
    let validated = password.validate_custom()?;

    let is_valid = authenticate_user(
        db,
        &user.username,
        &validated.current_password,
        user.role.as_str(),
    )
    .await
    .validate_custom()?;

    match is_valid {
        Some(_) => {
            update_user_password(db, &user.username, &validated.new_password)
                .await
                .validate_custom()?;

            Ok(Status::Ok)
        }
        _ => Err(Custom(
            Status::Unauthorized,
            Json(ValidationResponse::with_error(
                "current_password",
                "Current password is incorrect",
            )),
        )),
    }
}

// ---------------------------------------------------------------------------
// Admin: accounts
// ---------------------------------------------------------------------------

#[get("/admin/accounts")]
pub async fn api_get_accounts(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<AccountRow>>, Status> {
    user.require_permission(Permission::ManageAccounts)?;

    let accounts = list_accounts(db).await?;

    Ok(Json(accounts))
}

#[derive(Deserialize, Validate)]
pub struct AddProfessorRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
    #[validate(length(min = 1, message = "Full name is required"))]
    full_name: String,
    department: Option<String>,
}

#[post("/admin/add-professor", data = "<request>")]
pub async fn api_add_professor(
    request: Json<AddProfessorRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::ManageAccounts)
        .validate_custom()?;

    let validated = request.validate_custom()?;

    create_professor_account(
        db,
        &validated.username,
        &validated.password,
        &validated.full_name,
        validated.department.as_deref().unwrap_or(""),
    )
    .await
    .validate_custom()?;

    Ok(MessageResponse::new("Professor added successfully!"))
}

#[derive(Deserialize, Validate)]
pub struct AddStudentRequest {
    #[validate(length(min = 1, message = "Student ID is required"))]
    student_id: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
    #[validate(length(min = 1, message = "Full name is required"))]
    full_name: String,
    course: Option<String>,
    year_level: Option<String>,
    section: Option<String>,
}

#[post("/admin/add-student", data = "<request>")]
pub async fn api_add_student(
    request: Json<AddStudentRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::ManageAccounts)
        .validate_custom()?;

    let validated = request.validate_custom()?;

    create_student_account(
        db,
        &validated.student_id,
        &validated.password,
        &validated.full_name,
        validated.course.as_deref().unwrap_or(""),
        validated.year_level.as_deref().unwrap_or(""),
        validated.section.as_deref().unwrap_or(""),
    )
    .await
    .validate_custom()?;

    Ok(MessageResponse::new("Student added successfully!"))
}

#[derive(Deserialize, Validate)]
pub struct EditProfessorRequest {
    #[validate(length(min = 1, message = "Full name is required"))]
    full_name: String,
    department: Option<String>,
}

#[put("/admin/edit-professor/<id>", data = "<request>")]
pub async fn api_edit_professor(
    id: &str,
    request: Json<EditProfessorRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::ManageAccounts)
        .validate_custom()?;

    let validated = request.validate_custom()?;

    update_professor(
        db,
        id,
        &validated.full_name,
        validated.department.as_deref().unwrap_or(""),
    )
    .await
    .validate_custom()?;

    Ok(MessageResponse::new("Professor updated successfully!"))
}

#[derive(Deserialize, Validate)]
pub struct EditStudentRequest {
    #[validate(length(min = 1, message = "Full name is required"))]
    full_name: String,
    course: Option<String>,
    year_level: Option<String>,
    section: Option<String>,
}

#[put("/admin/edit-student/<id>", data = "<request>")]
pub async fn api_edit_student(
    id: &str,
    request: Json<EditStudentRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::ManageAccounts)
        .validate_custom()?;

    let validated = request.validate_custom()?;

    update_student(
        db,
        id,
        &validated.full_name,
        validated.course.as_deref().unwrap_or(""),
        validated.year_level.as_deref().unwrap_or(""),
        validated.section.as_deref().unwrap_or(""),
    )
    .await
    .validate_custom()?;

    Ok(MessageResponse::new("Student updated successfully!"))
}

/// An unknown role string is rejected before any storage is touched.
#[delete("/admin/delete/<role>/<id>")]
pub async fn api_delete_account(
    role: &str,
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, Status> {
    user.require_permission(Permission::ManageAccounts)?;

    match role {
        "professor" => {
            delete_professor_account(db, id).await?;
            Ok(MessageResponse::new("Professor account deleted successfully!"))
        }
        "student" => {
            delete_student_account(db, id).await?;
            Ok(MessageResponse::new("Student account deleted successfully!"))
        }
        _ => Err(Status::BadRequest),
    }
}

// ---------------------------------------------------------------------------
// Admin: subjects and assignments
// ---------------------------------------------------------------------------

#[get("/admin/subjects")]
pub async fn api_get_subjects(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Subject>>, Status> {
    user.require_permission(Permission::ManageSubjects)?;

    let subjects = list_subjects(db).await?;

    Ok(Json(subjects))
}

#[derive(Deserialize, Validate)]
pub struct AddSubjectRequest {
    #[validate(length(min = 1, message = "Subject code is required"))]
    subject_code: String,
    description: Option<String>,
    units: Option<i64>,
}

#[post("/admin/add-subject", data = "<request>")]
pub async fn api_add_subject(
    request: Json<AddSubjectRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::ManageSubjects)
        .validate_custom()?;

    let validated = request.validate_custom()?;

    create_subject(
        db,
        &validated.subject_code,
        validated.description.as_deref().unwrap_or(""),
        validated.units.unwrap_or(0),
    )
    .await
    .validate_custom()?;

    Ok(MessageResponse::new("Subject added successfully!"))
}

#[delete("/admin/delete-subject/<subject_code>")]
pub async fn api_delete_subject(
    subject_code: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, Status> {
    user.require_permission(Permission::ManageSubjects)?;

    delete_subject(db, subject_code).await?;

    Ok(MessageResponse::new("Subject deleted successfully!"))
}

#[derive(Deserialize, Validate)]
pub struct AssignSubjectRequest {
    #[validate(length(min = 1, message = "Professor ID is required"))]
    professor_id: String,
    #[validate(length(min = 1, message = "Subject code is required"))]
    subject_code: String,
    section: Option<String>,
    school_year: Option<String>,
    semester: Option<String>,
}

#[post("/admin/assign-professor-subject", data = "<request>")]
pub async fn api_assign_subject(
    request: Json<AssignSubjectRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::ManageAssignments)
        .validate_custom()?;

    let validated = request.validate_custom()?;

    create_assignment(
        db,
        &validated.professor_id,
        &validated.subject_code,
        validated.section.as_deref().unwrap_or(""),
        validated.school_year.as_deref().unwrap_or(""),
        validated.semester.as_deref().unwrap_or(""),
    )
    .await
    .validate_custom()?;

    Ok(MessageResponse::new(
        "Professor assigned to subject successfully!",
    ))
}

#[get("/admin/assignments")]
pub async fn api_get_assignments(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<AssignmentDetail>>, Status> {
    user.require_permission(Permission::ManageAssignments)?;

    let assignments = list_assignments(db).await?;

    Ok(Json(assignments))
}

#[delete("/admin/delete-assignment/<id>")]
pub async fn api_delete_assignment(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, Status> {
    user.require_permission(Permission::ManageAssignments)?;

    delete_assignment(db, id).await?;

    Ok(MessageResponse::new("Assignment deleted successfully!"))
}

// ---------------------------------------------------------------------------
// Professor
// ---------------------------------------------------------------------------

#[get("/professor/students/<professor_id>")]
pub async fn api_get_professor_students(
    professor_id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<RosterRow>>, Status> {
    user.require_any_permission(&[Permission::ViewRoster, Permission::ViewAllRosters])?;

    if user.username != professor_id && !user.has_permission(Permission::ViewAllRosters) {
        return Err(Status::Forbidden);
    }

    let roster = get_roster_for_professor(db, professor_id).await?;

    Ok(Json(roster))
}

#[get("/professor/subjects/<professor_id>")]
pub async fn api_get_professor_subjects(
    professor_id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<AssignedSubject>>, Status> {
    user.require_any_permission(&[
        Permission::ViewAssignedSubjects,
        Permission::ViewAllRosters,
    ])?;

    if user.username != professor_id && !user.has_permission(Permission::ViewAllRosters) {
        return Err(Status::Forbidden);
    }

    let subjects = get_assignments_for_professor(db, professor_id).await?;

    Ok(Json(subjects))
}

#[get("/professor/search/<student_id>")]
pub async fn api_search_student(
    student_id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Student>>, Status> {
    user.require_permission(Permission::EnrollStudents)?;

    let students = find_students_by_id(db, student_id).await?;

    Ok(Json(students))
}

#[derive(Deserialize, Validate)]
pub struct EnrollRequest {
    #[validate(length(min = 1, message = "Student ID is required"))]
    student_id: String,
    prof_subject_id: i64,
}

#[post("/professor/enroll", data = "<request>")]
pub async fn api_enroll_student(
    request: Json<EnrollRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, Status> {
    user.require_permission(Permission::EnrollStudents)?;

    let validated = request
        .validate_custom()
        .map_err(|_| Status::UnprocessableEntity)?;

    // The offering must exist and belong to the requesting professor.
    let assignment = get_assignment(db, validated.prof_subject_id).await?;

    if assignment.professor_id != user.username
        && !user.has_permission(Permission::ViewAllRosters)
    {
        return Err(Status::Forbidden);
    }

    enroll_student(db, &validated.student_id, validated.prof_subject_id).await?;

    Ok(MessageResponse::new("Student enrolled successfully!"))
}

#[derive(Deserialize)]
pub struct GradesUpdateRequest {
    midterm_grade: Option<f64>,
    final_grade: Option<f64>,
    remarks: Option<String>,
}

#[put("/professor/grades/<enrollment_id>", data = "<request>")]
pub async fn api_update_grades(
    enrollment_id: i64,
    request: Json<GradesUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, Status> {
    user.require_permission(Permission::RecordGrades)?;

    update_grades(
        db,
        enrollment_id,
        request.midterm_grade,
        request.final_grade,
        request.remarks.as_deref(),
    )
    .await?;

    Ok(MessageResponse::new("Grades updated successfully!"))
}

#[delete("/professor/enrollments/<id>")]
pub async fn api_delete_enrollment(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, Status> {
    user.require_permission(Permission::DropEnrollments)?;

    delete_enrollment(db, id).await?;

    Ok(MessageResponse::new("Enrollment deleted successfully!"))
}

/// Assignment lookup for the enroll flow: `{id}` on a match, `{}` otherwise.
#[get("/getProfSubject/<subject_code>?<prof>")]
pub async fn api_get_prof_subject(
    subject_code: &str,
    prof: Option<&str>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Status> {
    user.require_any_permission(&[Permission::EnrollStudents, Permission::ViewAllRosters])?;

    let prof = match prof {
        Some(prof) => prof,
        None => return Ok(Json(json!({}))),
    };

    if user.username != prof && !user.has_permission(Permission::ViewAllRosters) {
        return Err(Status::Forbidden);
    }

    match find_assignment(db, subject_code, prof).await? {
        Some(id) => Ok(Json(json!({ "id": id }))),
        None => Ok(Json(json!({}))),
    }
}

// ---------------------------------------------------------------------------
// Student
// ---------------------------------------------------------------------------

#[get("/student/grades/<student_id>")]
pub async fn api_get_student_grades(
    student_id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<GradeRow>>, Status> {
    user.require_any_permission(&[Permission::ViewOwnGrades, Permission::ViewAllGrades])?;

    if user.username != student_id && !user.has_permission(Permission::ViewAllGrades) {
        return Err(Status::Forbidden);
    }

    let grades = get_grades_for_student(db, student_id).await?;

    Ok(Json(grades))
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}
