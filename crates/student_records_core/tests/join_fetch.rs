//! Kept in its own test binary: the statement counter is process-global.

use std::sync::atomic::{AtomicUsize, Ordering};
use student_records_core::{
    FieldMap, MajorGateway, NewMajor, NewStudent, RecordGateway, Store, StudentGateway,
};

static SELECTS: AtomicUsize = AtomicUsize::new(0);

fn count_selects(sql: &str) {
    if sql.trim_start().to_ascii_uppercase().starts_with("SELECT") {
        SELECTS.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn find_students_resolves_majors_in_one_query() {
    let store = Store::open_in_memory().unwrap();
    let majors = MajorGateway::new(&store);
    let biology = majors.add(&FieldMap::from(&NewMajor::new("Biology"))).unwrap();
    let physics = majors.add(&FieldMap::from(&NewMajor::new("Physics"))).unwrap();
    let students = StudentGateway::new(&store);
    for (index, major_id) in [biology.id, physics.id, biology.id, physics.id]
        .into_iter()
        .enumerate()
    {
        students
            .add_student(&FieldMap::from(
                &NewStudent::new("Join", "Fetch", format!("join{index}@example.com"))
                    .in_major(major_id),
            ))
            .unwrap();
    }

    store.session().unwrap().trace(Some(count_selects));
    SELECTS.store(0, Ordering::SeqCst);

    let projections = students.find_students(&FieldMap::new()).unwrap();

    assert_eq!(SELECTS.load(Ordering::SeqCst), 1);
    assert_eq!(projections.len(), 4);
    assert!(projections
        .iter()
        .all(|projection| projection["major"] == "Biology" || projection["major"] == "Physics"));
}
