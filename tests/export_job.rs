use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use daten_export::export::{
    copy_export, CancellationToken, CsvFlavor, DuplicatePolicy, ExportError, ExportJob,
    ExportOptions, NullSink, ProgressSink,
};
use daten_export::model::{BuiltInCategory, Element, Parameter};
use daten_export::parser::parse_ifc_file;
use daten_export::ui::headless::run_with_progress_bar;
use pretty_assertions::assert_eq;

const LEGACY: ExportOptions = ExportOptions {
    flavor: CsvFlavor::Legacy,
    duplicates: DuplicatePolicy::FirstWins,
};

#[derive(Default)]
struct Recorder(RefCell<Vec<(u8, String)>>);

impl ProgressSink for Recorder {
    fn report(&self, percent: u8, message: &str) {
        self.0.borrow_mut().push((percent, message.to_string()));
    }
}

/// Flips the token as soon as the write pass starts.
struct CancelOnWrite {
    token: CancellationToken,
    reports: Recorder,
}

impl ProgressSink for CancelOnWrite {
    fn report(&self, percent: u8, message: &str) {
        if message.starts_with("Writing data") {
            self.token.cancel();
        }
        self.reports.report(percent, message);
    }
}

fn wall(name: &str) -> Element {
    Element::new(1, name, "Wall")
        .with_category(BuiltInCategory::Walls.into())
        .with_shape("Basic Wall")
}

fn door(name: &str) -> Element {
    Element::new(2, name, "Door")
        .with_category(BuiltInCategory::Doors.into())
        .with_shape("Single-Flush")
}

fn wall_and_door() -> Vec<Element> {
    vec![
        wall("Wall-1").with_parameter(Parameter::valued("Height", "Dimensions", "3m")),
        door("Door-1").with_parameter(Parameter::valued("Width", "Dimensions", "0.9m")),
    ]
}

fn many_walls(count: usize) -> Vec<Element> {
    (0..count)
        .map(|i| {
            wall(&format!("Wall-{i}"))
                .with_parameter(Parameter::valued("Height", "Dimensions", format!("{i}")))
        })
        .collect()
}

fn partial_path(target: &Path) -> std::path::PathBuf {
    let mut name = target.file_name().unwrap().to_os_string();
    name.push(".partial");
    target.with_file_name(name)
}

#[test]
fn wall_and_door_produce_expected_matrix() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("revitExport.csv");
    let job = ExportJob::new(&output, CancellationToken::new()).with_options(LEGACY);

    let summary = job.run(&wall_and_door(), &NullSink).unwrap();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "\u{feff}Name;Type;Details;Height;Width;\
         \r\nWall-1;Wall;Basic Wall;3m;;\
         \r\nDoor-1;Door;Single-Flush;;0.9m;"
    );
    assert_eq!(summary.rows, 2);
    assert_eq!(summary.columns, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.path, output);
}

#[test]
fn every_row_has_one_field_per_column() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.csv");
    let mut elements = wall_and_door();
    elements.push(
        wall("Wall-2")
            .with_parameter(Parameter::valued("Comments", "Identity Data", "north"))
            .with_parameter(Parameter::valued("Height", "Dimensions", "2.5m")),
    );
    let job = ExportJob::new(&output, CancellationToken::new());

    let summary = job.run(&elements, &NullSink).unwrap();

    let content = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = content.split_terminator("\r\n").collect();
    assert_eq!(lines.len(), 1 + elements.len());
    for line in lines {
        assert!(line.ends_with(';'));
        assert_eq!(line.matches(';').count(), 3 + summary.columns);
    }
    assert_eq!(summary.columns, 3);
}

#[test]
fn non_model_elements_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.csv");
    let mut elements = wall_and_door();
    elements.push(
        Element::new(3, "Zone A", "Zone")
            .with_category(BuiltInCategory::HvacZones.into())
            .with_parameter(Parameter::valued("Area", "Dimensions", "12")),
    );
    elements.push(Element::new(4, "Loose", "Element"));
    let job = ExportJob::new(&output, CancellationToken::new()).with_options(LEGACY);

    let summary = job.run(&elements, &NullSink).unwrap();

    assert_eq!(summary.rows, 2);
    assert_eq!(summary.skipped, 2);
    let content = fs::read_to_string(&output).unwrap();
    assert!(!content.contains("Area"));
    assert!(!content.contains("Zone A"));
}

#[test]
fn rerun_keeps_header_and_replaces_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.csv");
    fs::write(&output, "stale content from an older export").unwrap();
    let elements = many_walls(5);
    let job = ExportJob::new(&output, CancellationToken::new());

    job.run(&elements, &NullSink).unwrap();
    let first = fs::read_to_string(&output).unwrap();
    job.run(&elements, &NullSink).unwrap();
    let second = fs::read_to_string(&output).unwrap();

    assert!(!first.contains("stale"));
    assert_eq!(first, second);
    assert!(!partial_path(&output).exists());
}

#[test]
fn progress_is_monotonic_and_ends_with_ready_message() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.csv");
    let recorder = Recorder::default();
    let job = ExportJob::new(&output, CancellationToken::new());

    job.run(&many_walls(250), &recorder).unwrap();

    let reports = recorder.0.into_inner();
    let percents: Vec<u8> = reports.iter().map(|(p, _)| *p).collect();
    assert_eq!(percents, [0, 20, 40, 50, 70, 90, 100]);
    assert_eq!(reports[0].1, "Collecting definitions [0/250]");
    assert_eq!(reports[3].1, "Writing data [0/250]");
    assert_eq!(
        reports.last().unwrap().1,
        format!("Export ready at: {}", output.display())
    );
}

#[test]
fn cancellation_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.csv");
    fs::write(&output, "previous export").unwrap();
    let token = CancellationToken::new();
    let sink = CancelOnWrite {
        token: token.clone(),
        reports: Recorder::default(),
    };
    let job = ExportJob::new(&output, token);

    let err = job.run(&many_walls(10), &sink).unwrap_err();

    assert!(err.is_cancelled());
    assert!(!output.exists());
    assert!(!partial_path(&output).exists());
    let reports = sink.reports.0.into_inner();
    assert!(reports.iter().all(|(p, _)| *p < 100));
}

#[test]
fn cancelled_before_start_never_touches_the_target() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.csv");
    fs::write(&output, "previous export").unwrap();
    let token = CancellationToken::new();
    token.cancel();
    let job = ExportJob::new(&output, token);

    let err = job.run(&many_walls(3), &NullSink).unwrap_err();

    assert!(matches!(err, ExportError::Cancelled));
    assert_eq!(fs::read_to_string(&output).unwrap(), "previous export");
}

#[test]
fn cancelling_from_another_thread_stops_console_run() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.csv");
    fs::write(&output, "previous export").unwrap();
    let job = ExportJob::new(&output, CancellationToken::new());
    let token = job.token().clone();

    thread::spawn(move || token.cancel()).join().unwrap();
    let err = run_with_progress_bar(&job, &many_walls(3)).unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(fs::read_to_string(&output).unwrap(), "previous export");
    assert!(!partial_path(&output).exists());
}

#[test]
fn interrupt_during_console_run_never_orphans_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.csv");
    let partial = partial_path(&output);
    let elements = many_walls(200_000);
    let job = ExportJob::new(&output, CancellationToken::new());

    let outcome = thread::scope(|scope| {
        let worker = scope.spawn(|| run_with_progress_bar(&job, &elements));
        let deadline = Instant::now() + Duration::from_secs(10);
        while !partial.exists() && !worker.is_finished() && Instant::now() < deadline {
            thread::yield_now();
        }
        job.token().cancel();
        worker.join().unwrap()
    });

    // The run may win the race; either way no partial file is left behind.
    assert!(!partial.exists());
    match outcome {
        Ok(summary) => assert_eq!(summary.rows, elements.len()),
        Err(err) => {
            assert!(err.is_cancelled());
            assert!(!output.exists());
        }
    }
}

#[test]
fn strict_duplicates_fail_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.csv");
    let elements = vec![wall("Wall-1")
        .with_parameter(Parameter::valued("Height", "Dimensions", "3m"))
        .with_parameter(Parameter::valued("Height", "Constraints", "4m"))];
    let job = ExportJob::new(&output, CancellationToken::new()).with_options(ExportOptions {
        flavor: CsvFlavor::Quoted,
        duplicates: DuplicatePolicy::Strict,
    });

    let err = job.run(&elements, &NullSink).unwrap_err();

    assert!(matches!(
        err,
        ExportError::DuplicateParameter { ref element, ref name }
            if element == "Wall-1" && name == "Height"
    ));
    assert!(!output.exists());
    assert!(!partial_path(&output).exists());
}

#[test]
fn first_duplicate_wins_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.csv");
    let elements = vec![wall("Wall-1")
        .with_parameter(Parameter::valued("Height", "Dimensions", "3m"))
        .with_parameter(Parameter::valued("Height", "Constraints", "4m"))];
    let job = ExportJob::new(&output, CancellationToken::new());

    job.run(&elements, &NullSink).unwrap();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "\u{feff}Name;Type;Details;Height;\r\nWall-1;Wall;Basic Wall;3m;\r\n"
    );
}

#[test]
fn creates_missing_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("exports").join("out.csv");
    let job = ExportJob::new(&output, CancellationToken::new());

    job.run(&wall_and_door(), &NullSink).unwrap();

    assert!(output.exists());
}

#[test]
fn copy_replaces_existing_destination() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.csv");
    let destination = dir.path().join("revit_export.csv");
    fs::write(&destination, "old").unwrap();
    let job = ExportJob::new(&output, CancellationToken::new());
    let summary = job.run(&wall_and_door(), &NullSink).unwrap();

    let bytes = copy_export(&summary.path, &destination).unwrap();

    let exported = fs::read_to_string(&output).unwrap();
    assert_eq!(fs::read_to_string(&destination).unwrap(), exported);
    assert_eq!(bytes, exported.len() as u64);
}

#[test]
fn copy_to_missing_directory_is_a_copy_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.csv");
    fs::write(&output, "x").unwrap();

    let err = copy_export(&output, &dir.path().join("nope").join("copy.csv")).unwrap_err();

    assert!(matches!(err, ExportError::Copy { .. }));
}

#[test]
fn exports_parsed_ifc_model() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("model.ifc");
    fs::write(
        &model_path,
        "ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('0001',$,'Office Block',$,$,$,$,$,$);
#10=IFCWALL('w1',$,'Wall-1','exterior',$,$,$,$);
#11=IFCDOOR('d1',$,'Door-1',$,$,$,$,$,2100.,900.);
#12=IFCZONE('z1',$,'Zone A',$,$);
#13=IFCANNOTATION('a1',$,'Note',$,$,$,$);
#20=IFCWALLTYPE('wt',$,'Basic Wall:Generic - 200mm',$,$,$,$,$,$,.STANDARD.);
#21=IFCRELDEFINESBYTYPE('r1',$,$,$,(#10),#20);
#30=IFCPROPERTYSINGLEVALUE('Height',$,IFCLENGTHMEASURE(3.),$);
#32=IFCPROPERTYSET('ps1',$,'Dimensions',$,(#30));
#33=IFCRELDEFINESBYPROPERTIES('r2',$,$,$,(#10),#32);
#40=IFCQUANTITYLENGTH('Width',$,$,0.9);
#41=IFCELEMENTQUANTITY('q1',$,'BaseQuantities',$,$,(#40));
#42=IFCRELDEFINESBYPROPERTIES('r3',$,$,$,(#11),#41);
ENDSEC;
END-ISO-10303-21;
",
    )
    .unwrap();
    let model = parse_ifc_file(&model_path).unwrap();
    let output = dir.path().join("revitExport.csv");
    let job = ExportJob::new(&output, CancellationToken::new()).with_options(LEGACY);

    let summary = job.run(&model.elements, &NullSink).unwrap();

    assert_eq!(summary.skipped, 2);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "\u{feff}Name;Type;Details;Comments;Height;Width;\
         \r\nWall-1;Wall;Basic Wall;exterior;3;;\
         \r\nDoor-1;Door;;;;0.9;"
    );
}
