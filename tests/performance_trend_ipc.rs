use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_coursed");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn coursed");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn add(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    student: &str,
    timestamp: i64,
    value: f64,
) -> serde_json::Value {
    request_ok(
        stdin,
        reader,
        id,
        "performance.add",
        json!({
            "studentId": student,
            "courseId": "CS101",
            "recordId": format!("{}-{}", student, timestamp),
            "timestamp": timestamp,
            "value": value,
            "maxValue": 10,
            "kind": "quiz"
        }),
    )
}

#[test]
fn trend_unavailable_until_three_points() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    add(&mut stdin, &mut reader, "1", "S1", 1_000, 5.0);
    add(&mut stdin, &mut reader, "2", "S1", 2_000, 6.0);
    let trend = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "performance.trend",
        json!({ "studentId": "S1", "courseId": "CS101" }),
    );
    assert_eq!(trend.get("available").and_then(|v| v.as_bool()), Some(false));
    assert!(trend.get("prediction").map(|v| v.is_null()).unwrap_or(false));

    add(&mut stdin, &mut reader, "4", "S1", 3_000, 7.0);
    let trend = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "performance.trend",
        json!({ "studentId": "S1", "courseId": "CS101" }),
    );
    let prediction = trend.get("prediction").expect("prediction");
    let pct = prediction
        .get("predictedPercent")
        .and_then(|v| v.as_f64())
        .expect("predictedPercent");
    assert!((pct - 80.0).abs() < 1e-6);
    assert_eq!(prediction.get("nextTimestamp").and_then(|v| v.as_i64()), Some(4_000));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn top_performers_and_summary() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    add(&mut stdin, &mut reader, "1", "S1", 1, 7.0);
    add(&mut stdin, &mut reader, "2", "S2", 1, 9.0);
    add(&mut stdin, &mut reader, "3", "S3", 1, 7.0);
    let last = add(&mut stdin, &mut reader, "4", "S1", 2, 9.0);
    assert_eq!(last.get("weightedAverage").and_then(|v| v.as_f64()), Some(80.0));

    let top = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "performance.top",
        json!({ "courseId": "CS101", "limit": 2 }),
    );
    let students: Vec<&str> = top
        .get("students")
        .and_then(|v| v.as_array())
        .expect("students")
        .iter()
        .filter_map(|s| s.get("studentId").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(students, vec!["S2", "S1"]);

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "performance.summary",
        json!({ "studentId": "S1", "courseId": "CS101" }),
    );
    assert_eq!(summary.get("count").and_then(|v| v.as_u64()), Some(2));
    assert_eq!(summary.get("median").and_then(|v| v.as_f64()), Some(80.0));
    assert_eq!(summary.get("mode"), Some(&json!([70.0, 90.0])));

    let bad = request(
        &mut stdin,
        &mut reader,
        "7",
        "performance.add",
        json!({
            "studentId": "S1", "courseId": "CS101", "recordId": "x",
            "value": 1, "maxValue": 0, "kind": "quiz"
        }),
    );
    assert_eq!(bad.get("ok").and_then(|v| v.as_bool()), Some(false));

    drop(stdin);
    let _ = child.wait();
}
