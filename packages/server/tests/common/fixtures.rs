//! Test fixtures for creating test data.
//!
//! These fixtures use the model methods directly to create test data.
//! Identifiers, course codes and terms are uniquified per call because the
//! database container is shared across tests in a binary.

use anyhow::Result;
use sqlx::PgPool;
use std::sync::atomic::{AtomicI32, Ordering};
use uuid::Uuid;

use server_core::common::{AcademicYear, CourseId, RegistrationId, Semester, StudentId, UserId};
use server_core::domains::registration::models::{
    Course, CourseRegistration, CourseType, Enrollment,
};
use server_core::domains::users::{Role, User};

/// Monotonic counter for unique academic years and course levels within a
/// test binary (each binary gets its own database container).
static COUNTER: AtomicI32 = AtomicI32::new(0);

fn next_counter() -> i32 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A fresh academic year nobody else in this binary is using.
pub fn unique_year() -> AcademicYear {
    let start = 2100 + next_counter();
    format!("{}/{}", start, start + 1)
        .parse()
        .expect("generated year is well-formed")
}

/// A fresh course level, so curriculum queries see only this test's courses.
pub fn unique_level() -> i32 {
    1000 + next_counter() * 10
}

fn short_suffix() -> String {
    Uuid::new_v4().to_string()[..8].to_string()
}

/// Create a test student with a push token.
pub async fn create_student(pool: &PgPool) -> Result<User> {
    User::create(
        "Test Student",
        Role::Student,
        &format!("MAT-{}", short_suffix()),
        Some(&format!("student-push-{}", short_suffix())),
        pool,
    )
    .await
}

/// Create a test lecturer with a push token.
pub async fn create_lecturer(pool: &PgPool) -> Result<User> {
    User::create(
        "Test Lecturer",
        Role::Lecturer,
        &format!("STF-{}", short_suffix()),
        Some(&format!("lecturer-push-{}", short_suffix())),
        pool,
    )
    .await
}

/// Create an approval admin for the given role.
pub async fn create_admin(role: Role, pool: &PgPool) -> Result<User> {
    User::create(
        "Test Admin",
        role,
        &format!("ADM-{}", short_suffix()),
        None,
        pool,
    )
    .await
}

/// Create a gradable course at the given level/semester.
pub async fn create_course(
    level: i32,
    semester: Semester,
    course_type: CourseType,
    lecturer_id: Option<UserId>,
    pool: &PgPool,
) -> Result<Course> {
    Course::create(
        &format!("CSC-{}", short_suffix()),
        "Test Course",
        3,
        level,
        semester,
        course_type,
        lecturer_id,
        pool,
    )
    .await
}

/// Create a pending course registration.
pub async fn create_registration(
    student_id: StudentId,
    academic_year: &AcademicYear,
    semester: Semester,
    level: i32,
    pool: &PgPool,
) -> Result<RegistrationId> {
    let registration =
        CourseRegistration::create(student_id, academic_year, semester, level, pool).await?;
    Ok(registration.id)
}

/// Enroll a student in a course directly (bypassing derivation).
pub async fn enroll(
    student_id: StudentId,
    course_id: CourseId,
    academic_year: &AcademicYear,
    semester: Semester,
    pool: &PgPool,
) -> Result<()> {
    let mut conn = pool.acquire().await?;
    Enrollment::create_if_absent(student_id, course_id, academic_year, semester, None, &mut conn)
        .await?;
    Ok(())
}
