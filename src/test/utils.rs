#[cfg(test)]
pub mod test_db {
    use crate::db::{
        create_assignment, create_professor_account, create_student_account, create_subject,
        create_user, enroll_student, update_grades,
    };
    use crate::error::AppError;
    use crate::init_rocket;
    use rocket::http::{Cookie, ContentType};
    use rocket::local::asynchronous::Client;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};
    use std::collections::HashMap;
    use std::sync::Once;

    static INIT: Once = Once::new();
    pub static STANDARD_PASSWORD: &str = "password123";

    #[derive(Default)]
    pub struct TestDbBuilder {
        admins: Vec<String>,
        professors: Vec<TestProfessor>,
        students: Vec<TestStudent>,
        subjects: Vec<TestSubject>,
        assignments: Vec<TestAssignment>,
        enrollments: Vec<TestEnrollment>,
    }

    pub struct TestProfessor {
        pub username: String,
        pub full_name: String,
        pub department: String,
    }

    pub struct TestStudent {
        pub username: String,
        pub full_name: String,
        pub course: String,
        pub year_level: String,
        pub section: String,
    }

    pub struct TestSubject {
        pub subject_code: String,
        pub description: String,
        pub units: i64,
    }

    pub struct TestAssignment {
        pub professor_username: String,
        pub subject_code: String,
        pub section: String,
        pub school_year: String,
        pub semester: String,
    }

    pub struct TestEnrollment {
        pub student_username: String,
        pub professor_username: String,
        pub subject_code: String,
        pub midterm_grade: Option<f64>,
        pub final_grade: Option<f64>,
        pub remarks: Option<String>,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn admin(mut self, username: &str) -> Self {
            self.admins.push(username.to_string());
            self
        }

        pub fn professor(mut self, username: &str, full_name: &str, department: &str) -> Self {
            self.professors.push(TestProfessor {
                username: username.to_string(),
                full_name: full_name.to_string(),
                department: department.to_string(),
            });
            self
        }

        pub fn student(
            mut self,
            username: &str,
            full_name: &str,
            course: &str,
            year_level: &str,
            section: &str,
        ) -> Self {
            self.students.push(TestStudent {
                username: username.to_string(),
                full_name: full_name.to_string(),
                course: course.to_string(),
                year_level: year_level.to_string(),
                section: section.to_string(),
            });
            self
        }

        pub fn subject(mut self, subject_code: &str, description: &str, units: i64) -> Self {
            self.subjects.push(TestSubject {
                subject_code: subject_code.to_string(),
                description: description.to_string(),
                units,
            });
            self
        }

        pub fn assignment(
            mut self,
            professor_username: &str,
            subject_code: &str,
            section: &str,
            school_year: &str,
            semester: &str,
        ) -> Self {
            self.assignments.push(TestAssignment {
                professor_username: professor_username.to_string(),
                subject_code: subject_code.to_string(),
                section: section.to_string(),
                school_year: school_year.to_string(),
                semester: semester.to_string(),
            });
            self
        }

        pub fn enrollment(
            mut self,
            student_username: &str,
            professor_username: &str,
            subject_code: &str,
        ) -> Self {
            self.enrollments.push(TestEnrollment {
                student_username: student_username.to_string(),
                professor_username: professor_username.to_string(),
                subject_code: subject_code.to_string(),
                midterm_grade: None,
                final_grade: None,
                remarks: None,
            });
            self
        }

        pub fn graded_enrollment(
            mut self,
            student_username: &str,
            professor_username: &str,
            subject_code: &str,
            midterm_grade: f64,
            final_grade: f64,
            remarks: &str,
        ) -> Self {
            self.enrollments.push(TestEnrollment {
                student_username: student_username.to_string(),
                professor_username: professor_username.to_string(),
                subject_code: subject_code.to_string(),
                midterm_grade: Some(midterm_grade),
                final_grade: Some(final_grade),
                remarks: Some(remarks.to_string()),
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = env_logger::builder().is_test(true).try_init();
            });

            // A single connection keeps the in-memory database alive and
            // shared for the whole test.
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await?;

            sqlx::migrate!("./migrations").run(&pool).await?;

            for username in &self.admins {
                create_user(&pool, username, STANDARD_PASSWORD, "admin").await?;
            }

            for professor in &self.professors {
                create_professor_account(
                    &pool,
                    &professor.username,
                    STANDARD_PASSWORD,
                    &professor.full_name,
                    &professor.department,
                )
                .await?;
            }

            for student in &self.students {
                create_student_account(
                    &pool,
                    &student.username,
                    STANDARD_PASSWORD,
                    &student.full_name,
                    &student.course,
                    &student.year_level,
                    &student.section,
                )
                .await?;
            }

            for subject in &self.subjects {
                create_subject(&pool, &subject.subject_code, &subject.description, subject.units)
                    .await?;
            }

            let mut assignment_id_map: HashMap<(String, String), i64> = HashMap::new();

            for assignment in &self.assignments {
                let id = create_assignment(
                    &pool,
                    &assignment.professor_username,
                    &assignment.subject_code,
                    &assignment.section,
                    &assignment.school_year,
                    &assignment.semester,
                )
                .await?;

                assignment_id_map.insert(
                    (
                        assignment.professor_username.clone(),
                        assignment.subject_code.clone(),
                    ),
                    id,
                );
            }

            for enrollment in &self.enrollments {
                let assignment_id = assignment_id_map
                    .get(&(
                        enrollment.professor_username.clone(),
                        enrollment.subject_code.clone(),
                    ))
                    .copied()
                    .ok_or_else(|| {
                        AppError::NotFound(format!(
                            "No assignment for {} / {} in test fixture",
                            enrollment.professor_username, enrollment.subject_code
                        ))
                    })?;

                let enrollment_id =
                    enroll_student(&pool, &enrollment.student_username, assignment_id).await?;

                if enrollment.midterm_grade.is_some()
                    || enrollment.final_grade.is_some()
                    || enrollment.remarks.is_some()
                {
                    update_grades(
                        &pool,
                        enrollment_id,
                        enrollment.midterm_grade,
                        enrollment.final_grade,
                        enrollment.remarks.as_deref(),
                    )
                    .await?;
                }
            }

            Ok(TestDb {
                pool,
                assignment_id_map,
            })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub assignment_id_map: HashMap<(String, String), i64>,
    }

    impl TestDb {
        pub fn assignment_id(&self, professor_username: &str, subject_code: &str) -> Option<i64> {
            self.assignment_id_map
                .get(&(professor_username.to_string(), subject_code.to_string()))
                .copied()
        }

        pub async fn enrollment_id(
            &self,
            student_username: &str,
            assignment_id: i64,
        ) -> Result<i64, sqlx::Error> {
            let row: (i64,) = sqlx::query_as(
                "SELECT id FROM enrollments WHERE student_id = ? AND prof_subject_id = ? LIMIT 1",
            )
            .bind(student_username)
            .bind(assignment_id)
            .fetch_one(&self.pool)
            .await?;

            Ok(row.0)
        }

        pub async fn count(&self, table: &str) -> Result<i64, sqlx::Error> {
            let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&self.pool)
                .await?;

            Ok(row.0)
        }
    }

    /// Admin, one professor with one CS101 offering, one enrolled student.
    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .admin("admin_user")
            .professor("prof_user", "Prof User", "CS Dept")
            .student("student_user", "Student User", "BSCS", "1", "A")
            .subject("CS101", "Intro to Computing", 3)
            .assignment("prof_user", "CS101", "A", "2024-2025", "1st")
            .enrollment("student_user", "prof_user", "CS101")
            .build()
            .await
            .expect("Failed to build standard test DB")
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        let rocket = init_rocket(test_db.pool.clone()).await;

        let client = Client::tracked(rocket)
            .await
            .expect("Failed to create test client");

        (client, test_db)
    }

    pub async fn login_test_user(
        client: &Client,
        username: &str,
        password: &str,
        role: &str,
    ) -> Vec<Cookie<'static>> {
        let response = client
            .post("/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "role": role,
                    "username": username,
                    "password": password
                })
                .to_string(),
            )
            .dispatch()
            .await;

        response
            .cookies()
            .iter()
            .map(|cookie| cookie.clone().into_owned())
            .collect()
    }
}
