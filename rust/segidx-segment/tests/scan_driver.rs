use segidx_common::error::Error;
use segidx_segment::{
    BatchConsumer, ConsumeResult, RecordBatchHeader, RecordBatchType, ScanControl, SegmentScanner,
    tests::batch_generator::{SegmentProperties, generate_segment, ok_stream},
};

#[derive(Debug, PartialEq, Eq)]
enum Call {
    Accept(i64),
    Begin(i64, u64, u64),
    Skip(i64, u64, u64),
    Records(usize),
    End,
}

/// Records every callback and reads bodies of data batches only.
#[derive(Default)]
struct Recorder {
    calls: std::cell::RefCell<Vec<Call>>,
    stop_after: Option<usize>,
    stop_before_offset: Option<i64>,
    ended: usize,
}

impl BatchConsumer for Recorder {
    fn accept(&self, header: &RecordBatchHeader) -> ConsumeResult {
        self.calls.borrow_mut().push(Call::Accept(header.base_offset));
        if self.stop_before_offset == Some(header.base_offset) {
            ConsumeResult::StopScan
        } else if header.batch_type == RecordBatchType::RaftData {
            ConsumeResult::AcceptBatch
        } else {
            ConsumeResult::SkipBatch
        }
    }

    fn begin_batch(&mut self, header: RecordBatchHeader, position: u64, size: u64) {
        self.calls
            .get_mut()
            .push(Call::Begin(header.base_offset, position, size));
    }

    fn skip_body(&mut self, header: RecordBatchHeader, position: u64, size: u64) {
        self.calls
            .get_mut()
            .push(Call::Skip(header.base_offset, position, size));
    }

    fn consume_records(&mut self, records: &[u8]) {
        self.calls.get_mut().push(Call::Records(records.len()));
    }

    fn end_batch(&mut self) -> ScanControl {
        self.calls.get_mut().push(Call::End);
        self.ended += 1;
        if self.stop_after == Some(self.ended) {
            ScanControl::Stop
        } else {
            ScanControl::Continue
        }
    }
}

fn segment(batch_count: usize) -> Vec<segidx_segment::FramedBatch> {
    generate_segment(&SegmentProperties {
        batch_count,
        records_per_batch: 1..5,
        record_size: 1..4,
        non_data_every: Some(3),
        with_bodies: true,
        ..Default::default()
    })
}

#[test]
fn test_callback_order() {
    let batches = segment(6);
    let mut recorder = Recorder::default();
    let summary = SegmentScanner::new(&mut recorder)
        .scan(ok_stream(batches.clone()))
        .unwrap();
    assert_eq!(summary.batches, 6);
    assert!(!summary.stopped_early);

    let mut expected = Vec::new();
    for b in &batches {
        let offset = b.header.base_offset;
        expected.push(Call::Accept(offset));
        if b.header.batch_type == RecordBatchType::RaftData {
            expected.push(Call::Begin(offset, b.physical_base_offset, b.size_on_disk));
            expected.push(Call::Records(b.records.len()));
        } else {
            expected.push(Call::Skip(offset, b.physical_base_offset, b.size_on_disk));
        }
        expected.push(Call::End);
    }
    assert_eq!(recorder.calls.into_inner(), expected);
}

#[test]
fn test_consumer_stops_scan() {
    let batches = segment(10);
    let mut recorder = Recorder {
        stop_after: Some(4),
        ..Default::default()
    };
    let summary = SegmentScanner::new(&mut recorder)
        .scan(ok_stream(batches))
        .unwrap();
    assert_eq!(summary.batches, 4);
    assert!(summary.stopped_early);
    assert_eq!(recorder.ended, 4);
}

#[test]
fn test_consumer_rejects_batch() {
    let batches = segment(10);
    let stop_at = batches[7].header.base_offset;
    let mut recorder = Recorder {
        stop_before_offset: Some(stop_at),
        ..Default::default()
    };
    let summary = SegmentScanner::new(&mut recorder)
        .scan(ok_stream(batches))
        .unwrap();
    assert_eq!(summary.batches, 7);
    assert!(summary.stopped_early);
    let calls = recorder.calls.into_inner();
    assert_eq!(calls.last(), Some(&Call::Accept(stop_at)));
}

#[test]
fn test_reader_error_stops_scan() {
    let batches = segment(5);
    let stream = batches
        .into_iter()
        .map(Ok)
        .take(2)
        .chain(std::iter::once(Err(Error::invalid_format("batch header"))));
    let mut recorder = Recorder::default();
    let result = SegmentScanner::new(&mut recorder).scan(stream);
    assert!(result.is_err());
    assert_eq!(recorder.ended, 2);
}
