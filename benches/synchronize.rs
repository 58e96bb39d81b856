use criterion::{black_box, criterion_group, criterion_main, Criterion};

use timecode_sync::{Config, Document, Synchronizer};

/// A sequence with `tracks` video tracks, each followed by an audio track
/// of the same name that has no timecode of its own
fn project(tracks: usize) -> String {
    let mut media = String::from("<video>");
    for index in 0..tracks {
        media.push_str(&format!(
            "<track><clipitem><name>clip{index}</name><start>0</start><end>240</end>\
             <file><timecode><string>01:00:{:02}:{:02}</string></timecode></file></clipitem></track>",
            index / 24 % 60,
            index % 24
        ));
    }
    media.push_str("</video><audio>");
    for index in 0..tracks {
        media.push_str(&format!(
            "<track><clipitem><name>clip{index}</name><start>0</start><end>240</end><file/></clipitem></track>"
        ));
    }
    media.push_str("</audio>");

    format!(
        "<xmeml><sequence><name>Bench</name>\
         <timecode><rate><timebase>24</timebase></rate><string>01:00:00:00</string></timecode>\
         <media>{media}</media></sequence></xmeml>"
    )
}

fn bench_synchronize(c: &mut Criterion) {
    let synchronizer = Synchronizer::new(&Config::default()).unwrap();
    let xml = project(500);
    let document = Document::parse(&xml).unwrap();

    c.bench_function("parse_500_tracks", |b| {
        b.iter(|| Document::parse(black_box(&xml)).unwrap())
    });

    c.bench_function("process_500_tracks", |b| {
        b.iter(|| {
            let mut document = document.clone();
            synchronizer.process(black_box(&mut document)).unwrap()
        })
    });

    c.bench_function("write_500_tracks", |b| {
        b.iter(|| black_box(&document).to_xml_string().unwrap())
    });
}

criterion_group!(benches, bench_synchronize);
criterion_main!(benches);
