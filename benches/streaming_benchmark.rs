use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use excelchunk::{FieldSpec, FieldValue, MemoryEvents, ReaderOptions, RecordReader, SheetRecord};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

#[derive(Default)]
struct Item {
    id: String,
    name: String,
    value: f64,
}

impl SheetRecord for Item {
    fn schema() -> Vec<FieldSpec> {
        vec![
            FieldSpec::text("id", "A"),
            FieldSpec::text("name", "B"),
            FieldSpec::number("value", "C"),
        ]
    }

    fn assign(&mut self, field: &str, value: FieldValue) {
        match field {
            "id" => self.id = value.into_text().unwrap_or_default(),
            "name" => self.name = value.into_text().unwrap_or_default(),
            "value" => self.value = value.as_f64().unwrap_or_default(),
            _ => {}
        }
    }
}

fn rows(size: usize) -> Vec<Vec<(String, String)>> {
    let mut rows = vec![vec![
        ("A1".to_string(), "ID".to_string()),
        ("B1".to_string(), "Name".to_string()),
        ("C1".to_string(), "Value".to_string()),
    ]];
    for i in 1..=size {
        let r = i + 1;
        rows.push(vec![
            (format!("A{}", r), i.to_string()),
            (format!("B{}", r), format!("Name_{}", i)),
            (format!("C{}", r), (i * 100).to_string()),
        ]);
    }
    rows
}

/// Single-sheet workbook with inline strings, so no shared string table
fn write_fixture(path: &Path, size: usize) {
    let mut zip = ZipWriter::new(std::fs::File::create(path).unwrap());
    let options = SimpleFileOptions::default();

    let mut sheet = String::from(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (index, cells) in rows(size).iter().enumerate() {
        sheet.push_str(&format!(r#"<row r="{}">"#, index + 1));
        for (reference, value) in cells {
            sheet.push_str(&format!(
                r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                reference, value
            ));
        }
        sheet.push_str("</row>");
    }
    sheet.push_str("</sheetData></worksheet>");

    let parts = [
        (
            "xl/workbook.xml",
            r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Data" sheetId="1" r:id="rId1"/></sheets></workbook>"#.to_string(),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<Relationships><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#.to_string(),
        ),
        ("xl/worksheets/sheet1.xml", sheet),
    ];
    for (name, body) in parts {
        zip.start_file(name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn benchmark_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");
    group.sample_size(10);

    for size in [1000, 5000, 10000].iter() {
        // Prepare test file once
        let temp = NamedTempFile::new().unwrap();
        write_fixture(temp.path(), *size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let options = ReaderOptions::default().with_partition_size(500);
                let mut reader = RecordReader::with_options(Item::default, options).unwrap();
                reader
                    .process(temp.path(), |batch: Vec<Item>| {
                        black_box(batch);
                        Ok::<(), std::io::Error>(())
                    })
                    .unwrap();
            });
        });
    }

    group.finish();
}

fn benchmark_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble");
    group.sample_size(10);

    for partition_size in [2, 100, 1000].iter() {
        let source = MemoryEvents::from_rows(rows(10000));

        group.bench_with_input(
            BenchmarkId::from_parameter(partition_size),
            partition_size,
            |b, &partition_size| {
                b.iter(|| {
                    let options = ReaderOptions::default().with_partition_size(partition_size);
                    let mut reader = RecordReader::with_options(Item::default, options).unwrap();
                    reader
                        .process_events(source.clone(), |batch: Vec<Item>| {
                            black_box(batch);
                            Ok::<(), std::io::Error>(())
                        })
                        .unwrap();
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_read, benchmark_assemble);
criterion_main!(benches);
