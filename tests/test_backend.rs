//! Integration test: train / predict contract for both backends

use grade_predictor::prelude::*;
use grade_predictor::training::TrainedModel;
use polars::prelude::*;
use std::sync::Arc;

fn two_students() -> DataFrame {
    df!(
        "id" => &[1i64, 2],
        "f1" => &[5.0, 1.0],
        "f2" => &[3.0, 9.0],
        "label" => &[2.0, 3.5]
    )
    .unwrap()
}

fn students_df() -> DataFrame {
    df!(
        "StudentID" => &[1001i64, 1002, 1003, 1004, 1005, 1006, 1007, 1008, 1009, 1010,
                         1011, 1012, 1013, 1014, 1015, 1016, 1017, 1018, 1019, 1020],
        "Age" => &[17i64, 18, 15, 17, 17, 18, 15, 15, 17, 17,
                   16, 15, 17, 17, 17, 18, 15, 16, 18, 16],
        "Gender" => &[1i64, 0, 0, 1, 1, 0, 0, 1, 0, 1,
                      1, 1, 0, 0, 0, 1, 0, 1, 1, 0],
        "StudyTimeWeekly" => &[19.8, 15.4, 4.2, 10.0, 4.7, 8.2, 15.6, 15.4, 14.3, 4.0,
                               7.2, 10.6, 5.4, 12.0, 18.1, 11.7, 2.1, 6.6, 16.3, 9.0],
        "Absences" => &[7i64, 0, 26, 14, 17, 0, 10, 22, 1, 0,
                        17, 10, 4, 20, 8, 5, 29, 12, 3, 15],
        "GradeClass" => &[2.0, 1.0, 4.0, 3.0, 4.0, 1.0, 4.0, 4.0, 2.0, 1.0,
                          4.0, 3.0, 1.0, 4.0, 2.0, 1.0, 4.0, 3.0, 1.0, 3.0]
    )
    .unwrap()
}

#[test]
fn test_two_row_linear_prediction() {
    let dataset = Dataset::from_frame(two_students(), "id", "label").unwrap();
    let (x, y) = dataset.split().unwrap();

    let result = Backend::linear().train(&x, &y);
    assert!(result.is_ok(), "Linear training should succeed: {:?}", result.err());
    let model = result.unwrap();

    let student = dataset.student("1").unwrap();
    let prediction = model.predict(&student.features).unwrap();
    assert_eq!(prediction.len(), 1);
    assert!(prediction[0].is_finite());
}

#[test]
fn test_two_row_ensemble_prediction() {
    let dataset = Dataset::from_frame(two_students(), "id", "label").unwrap();
    let (x, y) = dataset.split().unwrap();

    let model = Backend::ensemble().train(&x, &y).unwrap();
    let prediction = model.predict(&x).unwrap();
    assert_eq!(prediction.len(), 2);
    // Every tree leaf holds an observed label, so the mean stays within range
    assert!(prediction.iter().all(|p| (2.0..=3.5).contains(p)));
}

#[test]
fn test_one_prediction_per_row() {
    let dataset = Dataset::from_frame(students_df(), "StudentID", "GradeClass").unwrap();
    let (x, y) = dataset.split().unwrap();

    for backend in [Backend::linear(), Backend::ensemble()] {
        let model = backend.train(&x, &y).unwrap();
        let predictions = backend.predict(&model, &x).unwrap();
        assert_eq!(predictions.len(), dataset.n_rows());
        assert!(predictions.iter().all(|p| p.is_finite()));
    }
}

#[test]
fn test_training_is_deterministic() {
    let dataset = Dataset::from_frame(students_df(), "StudentID", "GradeClass").unwrap();
    let (x, y) = dataset.split().unwrap();

    for backend in [Backend::linear(), Backend::ensemble()] {
        let first = backend.train(&x, &y).unwrap().predict(&x).unwrap();
        let second = backend.train(&x, &y).unwrap().predict(&x).unwrap();
        assert_eq!(first, second, "{} should be deterministic", backend.model_type());
    }
}

#[test]
fn test_seed_changes_ensemble() {
    let dataset = Dataset::from_frame(students_df(), "StudentID", "GradeClass").unwrap();
    let (x, y) = dataset.split().unwrap();

    let a = Backend::new(ModelType::RandomForest, TrainingConfig::default().with_random_state(1));
    let b = Backend::new(ModelType::RandomForest, TrainingConfig::default().with_random_state(2));

    let pa = a.train(&x, &y).unwrap().predict(&x).unwrap();
    let pb = b.train(&x, &y).unwrap().predict(&x).unwrap();
    assert_ne!(pa, pb);
}

#[test]
fn test_schema_mismatch() {
    let dataset = Dataset::from_frame(students_df(), "StudentID", "GradeClass").unwrap();
    let (x, y) = dataset.split().unwrap();
    let model = Backend::ensemble().train(&x, &y).unwrap();

    let other = Dataset::from_frame(
        students_df().drop("Absences").unwrap(),
        "StudentID",
        "GradeClass",
    )
    .unwrap();
    let student = other.student("1001").unwrap();

    match model.predict(&student.features) {
        Err(PredictorError::SchemaMismatch { expected, actual }) => {
            assert_eq!(expected.len(), 4);
            assert_eq!(actual.len(), 3);
        }
        other => panic!("expected SchemaMismatch, got {:?}", other),
    }
}

#[test]
fn test_missing_label_fails_before_training() {
    let frame = students_df().drop("GradeClass").unwrap();
    let result = Dataset::from_frame(frame, "StudentID", "GradeClass");
    assert!(matches!(result, Err(PredictorError::MissingColumn(ref c)) if c == "GradeClass"));
}

#[test]
fn test_ensemble_importances_cover_schema() {
    let dataset = Dataset::from_frame(students_df(), "StudentID", "GradeClass").unwrap();
    let (x, y) = dataset.split().unwrap();
    let model = Backend::ensemble().train(&x, &y).unwrap();

    let importances = model.feature_importances().unwrap();
    assert_eq!(importances.len(), 4);
    let total: f64 = importances.iter().map(|(_, v)| v).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn test_hold_out_evaluation() {
    let dataset = Dataset::from_frame(students_df(), "StudentID", "GradeClass").unwrap();
    let (x, y) = dataset.split().unwrap();
    let split = train_test_split(x.n_rows(), 0.2, 42).unwrap();
    assert_eq!(split.test_indices.len(), 4);

    for backend in [Backend::linear(), Backend::ensemble()] {
        let report = evaluate(&backend, &x, &y, &split).unwrap();
        assert_eq!(report.n_train, 16);
        assert!(report.metrics.mse.unwrap() >= 0.0);
        assert!(report.metrics.r2.is_some());

        let json = report.to_json().unwrap();
        assert!(json.contains("\"mse\""));
    }
}

#[test]
fn test_default_ensemble_has_100_trees() {
    let dataset = Dataset::from_frame(students_df(), "StudentID", "GradeClass").unwrap();
    let (x, y) = dataset.split().unwrap();

    let backend = Backend::ensemble();
    assert_eq!(backend.config().random_state, 42);

    let model = backend.train(&x, &y).unwrap();
    match model.model() {
        TrainedModel::RandomForest(rf) => assert_eq!(rf.n_trees(), 100),
        other => panic!("expected a random forest, got {:?}", other),
    }
}

#[test]
fn test_cache_serves_requested_forest_size() {
    let dataset = Dataset::from_frame(students_df(), "StudentID", "GradeClass").unwrap();
    let cache = ModelCache::new(4).unwrap();

    let small = Backend::new(ModelType::RandomForest, TrainingConfig::default().with_n_estimators(3));
    let small_model = cache.get_or_train(&small, &dataset).unwrap();
    let full_model = cache.get_or_train(&Backend::ensemble(), &dataset).unwrap();

    assert!(!Arc::ptr_eq(&small_model, &full_model));
    let trees = |m: &FittedModel| match m.model() {
        TrainedModel::RandomForest(rf) => rf.n_trees(),
        TrainedModel::LinearRegression(_) => 0,
    };
    assert_eq!(trees(&small_model), 3);
    assert_eq!(trees(&full_model), 100);
}

#[test]
fn test_cache_separates_label_columns() {
    let frame = df!(
        "StudentID" => &[1i64, 2, 3, 4, 5, 6],
        "Age" => &[15i64, 16, 17, 18, 15, 16],
        "GPA" => &[3.1, 2.4, 1.2, 3.8, 0.9, 2.0],
        "GradeClass" => &[1.0, 2.0, 4.0, 0.0, 4.0, 3.0]
    )
    .unwrap();
    let by_class = Dataset::from_frame(frame.clone(), "StudentID", "GradeClass").unwrap();
    let by_gpa = Dataset::from_frame(frame, "StudentID", "GPA").unwrap();
    let cache = ModelCache::new(4).unwrap();

    let class_model = cache.get_or_train(&Backend::linear(), &by_class).unwrap();
    let gpa_model = cache.get_or_train(&Backend::linear(), &by_gpa).unwrap();

    assert_eq!(class_model.label(), "GradeClass");
    assert_eq!(gpa_model.label(), "GPA");

    let student = by_gpa.student("3").unwrap();
    let prediction = gpa_model.predict(&student.features).unwrap();
    assert_eq!(prediction.len(), 1);
}
