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

fn mark(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    record_id: &str,
    date: &str,
    status: &str,
) -> serde_json::Value {
    request_ok(
        stdin,
        reader,
        id,
        "attendance.mark",
        json!({
            "studentId": "S1",
            "courseId": "CS101",
            "recordId": record_id,
            "date": date,
            "status": status
        }),
    )
}

#[test]
fn attendance_percentage_and_date_range() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    mark(&mut stdin, &mut reader, "1", "a1", "2024-03-04", "present");
    mark(&mut stdin, &mut reader, "2", "a2", "2024-03-05", "absent");
    mark(&mut stdin, &mut reader, "3", "a3", "2024-03-06", "late");
    let last = mark(&mut stdin, &mut reader, "4", "a4", "2024-03-07", "absent");
    assert_eq!(last.get("percentage").and_then(|v| v.as_f64()), Some(50.0));

    let range = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "attendance.range",
        json!({ "studentId": "S1", "courseId": "CS101", "from": "2024-03-05", "to": "2024-03-06" }),
    );
    let records = range.get("records").and_then(|v| v.as_array()).expect("records");
    let dates: Vec<&str> = records
        .iter()
        .filter_map(|r| r.get("date").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(dates, vec!["2024-03-05", "2024-03-06"]);
    assert_eq!(records[1].get("status").and_then(|v| v.as_str()), Some("late"));

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "attendance.courseSummary",
        json!({ "courseId": "CS101" }),
    );
    let rows = summary.get("students").and_then(|v| v.as_array()).expect("students");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("sessions").and_then(|v| v.as_u64()), Some(4));
    assert_eq!(rows[0].get("attended").and_then(|v| v.as_u64()), Some(2));

    let courses = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "attendance.courses",
        json!({ "studentId": "S1" }),
    );
    assert_eq!(courses.get("courses"), Some(&json!(["CS101"])));

    let cleared = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "attendance.clear",
        json!({ "studentId": "S1", "courseId": "CS101" }),
    );
    assert_eq!(cleared.get("removed").and_then(|v| v.as_u64()), Some(4));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn attendance_rejects_bad_status_and_dates() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let bad_status = request(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.mark",
        json!({ "studentId": "S1", "courseId": "CS101", "recordId": "a1", "status": "tardy" }),
    );
    assert_eq!(bad_status.get("ok").and_then(|v| v.as_bool()), Some(false));

    let bad_range = request(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.range",
        json!({ "studentId": "S1", "courseId": "CS101", "from": "2024-03-09", "to": "2024-03-01" }),
    );
    assert_eq!(bad_range.get("ok").and_then(|v| v.as_bool()), Some(false));

    let bad_date = request(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.range",
        json!({ "studentId": "S1", "courseId": "CS101", "from": "March 1st" }),
    );
    assert_eq!(bad_date.get("ok").and_then(|v| v.as_bool()), Some(false));

    drop(stdin);
    let _ = child.wait();
}
