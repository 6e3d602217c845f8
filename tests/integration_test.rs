use mcq_extractor::config::{Config, EngineConfig, LayoutProfile, SortOrder};
use mcq_extractor::models::{
    AnswerMark, ColumnStream, DocumentInput, McqRecord, OptionKey, PageInput, PositionedToken,
};
use mcq_extractor::services::{
    AnswerKeyResolver, ColumnLayout, Deduplicator, LayoutClassifier, OptionExtractor, OptionStyle,
    QuestionSegmenter,
};
use mcq_extractor::{extract_mcqs, App, DocumentProcessor};
use std::collections::BTreeMap;

// ========== 辅助函数 ==========

fn text_page(no: u32, text: &str) -> PageInput {
    PageInput {
        page_number: no,
        full_text: text.to_string(),
        tokens: Vec::new(),
        page_width: 600.0,
        page_height: 800.0,
    }
}

/// 每行一个词元，左栏 x=30，右栏 x=380
fn two_column_page(no: u32, left: &[&str], right: &[&str]) -> PageInput {
    let mut tokens = Vec::new();
    for (i, line) in left.iter().enumerate() {
        tokens.push(PositionedToken::new(*line, 30.0, 60.0 + i as f64 * 14.0));
    }
    for (i, line) in right.iter().enumerate() {
        tokens.push(PositionedToken::new(*line, 380.0, 60.0 + i as f64 * 14.0));
    }
    PageInput {
        page_number: no,
        full_text: String::new(),
        tokens,
        page_width: 600.0,
        page_height: 800.0,
    }
}

fn record(no: u32, page: u32, question: &str, n_options: usize) -> McqRecord {
    McqRecord {
        question_no: no,
        question: question.to_string(),
        options: OptionKey::ALL
            .iter()
            .take(n_options)
            .map(|k| (*k, format!("choice {}", k)))
            .collect::<BTreeMap<_, _>>(),
        answer: None,
        page,
    }
}

const SCENARIO_A: &str = "4. Which of the following are computer languages?\n1. Cobra 2. Python\n3. Squirrel 4. Java\n(a) Only 1 (b) Only 3\n(c) Only 1, 2 and 3 (d) All of the above\nAns. (d)";

// ========== 场景测试 ==========

#[test]
fn test_embedded_list_question() {
    let config = EngineConfig::default();
    let stream = ColumnStream {
        page: 1,
        column: 0,
        text: SCENARIO_A.to_string(),
    };

    let segmented = QuestionSegmenter::new(&config)
        .unwrap()
        .segment(&stream, OptionStyle::Parenthesized);
    assert_eq!(segmented.spans.len(), 1);

    let record = OptionExtractor::new(&config)
        .extract(&segmented.spans[0], OptionStyle::Parenthesized)
        .unwrap();
    assert_eq!(record.question_no, 4);
    assert_eq!(record.options.len(), 4);
    assert_eq!(record.answer, Some(AnswerMark::Key(OptionKey::D)));
}

#[test]
fn test_sparse_page_is_single_column() {
    let mut tokens = Vec::new();
    for i in 0..5 {
        tokens.push(PositionedToken::new("left", 40.0, 100.0 + i as f64 * 12.0));
    }
    for i in 0..3 {
        tokens.push(PositionedToken::new("right", 520.0, 100.0 + i as f64 * 12.0));
    }
    let page = PageInput {
        page_number: 1,
        full_text: String::new(),
        tokens,
        page_width: 600.0,
        page_height: 800.0,
    };

    let classifier = LayoutClassifier::new(&EngineConfig::default()).unwrap();
    let decision = classifier.classify_page(&page, "");
    assert_eq!(decision.columns, ColumnLayout::Single);
    assert!(!decision.is_multi_column());
}

#[test]
fn test_answer_key_parsing() {
    let resolver = AnswerKeyResolver::new(&EngineConfig::default()).unwrap();
    let map = resolver.parse("ANSWER KEY\n1.(a) 2.(b) 3.(c)");
    let expected: BTreeMap<u32, AnswerMark> = BTreeMap::from([
        (1, AnswerMark::Key(OptionKey::A)),
        (2, AnswerMark::Key(OptionKey::B)),
        (3, AnswerMark::Key(OptionKey::C)),
    ]);
    assert_eq!(map, expected);
}

#[test]
fn test_single_option_question_is_dropped() {
    let document = DocumentInput::new(
        "single_option",
        vec![text_page(1, "1. Name the capital city of India\n(a) New Delhi")],
    );
    let records = extract_mcqs(&document, &EngineConfig::default()).unwrap();
    assert!(records.is_empty());
}

#[test]
fn test_duplicate_keeps_richest_record() {
    let dedup = Deduplicator::new(30, SortOrder::PageThenNumber);
    let out = dedup.deduplicate(vec![
        record(7, 3, "Which vitamin is made in sunlight?", 2),
        record(7, 3, "Which vitamin is made in sunlight?", 4),
    ]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].options.len(), 4);
}

// ========== 端到端测试 ==========

fn exam_document() -> DocumentInput {
    let left = [
        "1. Which device is used to input text into a computer?",
        "(a) Keyboard (b) Monitor",
        "(c) Printer (d) Speaker",
        "2. Which of the following are computer languages?",
        "1. Cobra 2. Python",
        "3. Squirrel 4. Java",
        "(a) Only 1 (b) Only 3",
        "(c) Only 1, 2 and 3 (d) All of the above",
        "Ans. (d)",
    ];
    let right = [
        "3. Which memory is volatile in nature?",
        "(a) RAM (b) ROM",
        "(c) PROM (d) EPROM",
        "4. What does CPU stand for in computing?",
        "(a) Central Processing Unit",
        "(b) Central Program Unit",
        "(c) Computer Personal Unit",
        "(d) Control Processing Unit",
    ];
    let mut page1 = two_column_page(1, &left, &right);
    // 页眉补足词元数量，使分栏检测判为双栏；页眉在第一个题号之前，不进入题目
    for i in 0..25 {
        page1
            .tokens
            .push(PositionedToken::new("Computer", 30.0 + i as f64 * 8.0, 20.0));
        page1
            .tokens
            .push(PositionedToken::new("Awareness", 380.0 + i as f64 * 8.0, 20.0));
    }

    DocumentInput::new(
        "computer_basics",
        vec![
            page1,
            text_page(2, "ANSWER KEY\n1.(a) 2.(b) 3.(a) 4.(*)"),
        ],
    )
}

#[test]
fn test_end_to_end_two_column_document() {
    let processor = DocumentProcessor::new(&EngineConfig::default()).unwrap();
    let report = processor.process(&exam_document(), 1).unwrap();

    assert!(report.layout.is_multi_column());
    let numbers: Vec<u32> = report.records.iter().map(|r| r.question_no).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);

    // 行内答案优先，其余来自答案页
    let answers: Vec<Option<AnswerMark>> = report.records.iter().map(|r| r.answer).collect();
    assert_eq!(
        answers,
        vec![
            Some(AnswerMark::Key(OptionKey::A)),
            Some(AnswerMark::Key(OptionKey::D)),
            Some(AnswerMark::Key(OptionKey::A)),
            Some(AnswerMark::Disputed),
        ]
    );
    assert_eq!(report.stats.answer_key_pages, 1);
    assert_eq!(report.stats.answers_resolved, 3);
    assert_eq!(report.stats.with_four_options, 4);
    assert_eq!(report.records[3].options[&OptionKey::A], "Central Processing Unit");
}

#[test]
fn test_left_column_precedes_right_column() {
    let config = EngineConfig {
        sort_order: SortOrder::Extraction,
        ..EngineConfig::default()
    };
    let document = exam_document();
    let records = extract_mcqs(&document, &config).unwrap();
    let pages_and_numbers: Vec<(u32, u32)> =
        records.iter().map(|r| (r.page, r.question_no)).collect();
    assert_eq!(pages_and_numbers, vec![(1, 1), (1, 2), (1, 3), (1, 4)]);
}

#[test]
fn test_left_column_first_even_with_higher_numbers() {
    let left = [
        "20. Which planet is closest to the sun?",
        "(a) Mercury (b) Venus",
        "(c) Earth (d) Mars",
    ];
    let right = [
        "5. Which gas makes up most of the air?",
        "(a) Nitrogen (b) Oxygen",
        "(c) Argon (d) Carbon dioxide",
    ];
    let mut page = two_column_page(1, &left, &right);
    for i in 0..25 {
        page.tokens
            .push(PositionedToken::new("Science", 30.0 + i as f64 * 8.0, 20.0));
        page.tokens
            .push(PositionedToken::new("Quiz", 380.0 + i as f64 * 8.0, 20.0));
    }
    let document = DocumentInput::new("science_quiz", vec![page]);

    let config = EngineConfig {
        sort_order: SortOrder::Extraction,
        ..EngineConfig::default()
    };
    let records = extract_mcqs(&document, &config).unwrap();
    let numbers: Vec<u32> = records.iter().map(|r| r.question_no).collect();
    assert_eq!(numbers, vec![20, 5]);
    assert_eq!(records[1].options[&OptionKey::A], "Nitrogen");
}

#[test]
fn test_right_column_starting_with_sub_list_tail() {
    let left = [
        "150. Which of the following are computer languages?",
        "1. Cobra 2. Python",
    ];
    let right = [
        "3. Squirrel 4. Java",
        "(a) Only 1 (b) Only 3",
        "(c) Only 1, 2 and 3 (d) All of the above",
        "Ans. (d)",
        "152. Which device is used to input text into a computer?",
        "(a) Keyboard (b) Monitor",
        "(c) Printer (d) Speaker",
        "153. Which memory is volatile in nature?",
        "(a) RAM (b) ROM",
        "(c) PROM (d) EPROM",
    ];
    let mut page = two_column_page(1, &left, &right);
    for i in 0..25 {
        page.tokens
            .push(PositionedToken::new("Computer", 30.0 + i as f64 * 8.0, 20.0));
        page.tokens
            .push(PositionedToken::new("Awareness", 380.0 + i as f64 * 8.0, 20.0));
    }
    let document = DocumentInput::new("carried_list", vec![page]);

    let records = extract_mcqs(&document, &EngineConfig::default()).unwrap();
    let by_number: BTreeMap<u32, &McqRecord> =
        records.iter().map(|r| (r.question_no, r)).collect();
    assert_eq!(by_number[&152].options.len(), 4);
    assert_eq!(by_number[&152].options[&OptionKey::A], "Keyboard");
    assert_eq!(by_number[&153].options[&OptionKey::C], "PROM");
}

#[test]
fn test_extraction_is_deterministic() {
    let document = exam_document();
    let config = EngineConfig::default();
    let first = extract_mcqs(&document, &config).unwrap();
    let second = extract_mcqs(&document, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_records_respect_invariants() {
    let config = EngineConfig::default();
    let records = extract_mcqs(&exam_document(), &config).unwrap();
    for record in &records {
        assert!(record.options.len() <= 4);
        assert!(record.options.len() >= config.min_options);
        assert!(record.question.chars().count() > config.min_question_len);
    }
}

#[test]
fn test_prefixed_profile_document() {
    let config = EngineConfig::for_profile(LayoutProfile::Prefixed);
    let document = DocumentInput::new(
        "gate_paper",
        vec![text_page(
            1,
            "GENERAL APTITUDE\nQ.1 The synonym of the word 'abundant' is\n(A) scarce\n(B) plentiful\n(C) rare\n(D) meagre\nQ.2 Choose the odd one out from the list\n(A) apple\n(B) mango\n(C) carrot\n(D) banana",
        )],
    );
    let records = extract_mcqs(&document, &config).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].options[&OptionKey::B], "plentiful");
    assert_eq!(records[1].question_no, 2);
}

#[test]
fn test_empty_document_is_an_ingestion_error() {
    let err = extract_mcqs(&DocumentInput::new("nothing", Vec::new()), &EngineConfig::default())
        .unwrap_err();
    assert!(err.is_ingestion());
}

#[tokio::test]
async fn test_app_writes_output_files() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let logs = tempfile::tempdir().unwrap();

    let document = exam_document();
    std::fs::write(
        input.path().join("computer_basics.json"),
        serde_json::to_string(&document).unwrap(),
    )
    .unwrap();
    std::fs::write(input.path().join("broken.json"), "{").unwrap();

    let config = Config {
        input_folder: input.path().to_string_lossy().to_string(),
        output_folder: output.path().to_string_lossy().to_string(),
        output_log_file: logs.path().join("output.txt").to_string_lossy().to_string(),
        reject_log_file: Some(logs.path().join("reject.txt").to_string_lossy().to_string()),
        max_concurrent_documents: 2,
        ..Config::default()
    };

    let stats = App::initialize(config).await.unwrap().run().await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.success, 1);
    assert_eq!(stats.records, 4);

    let written = std::fs::read_to_string(output.path().join("computer_basics_mcqs.json")).unwrap();
    let records: Vec<McqRecord> = serde_json::from_str(&written).unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records[3].answer, Some(AnswerMark::Disputed));

    let log = std::fs::read_to_string(logs.path().join("output.txt")).unwrap();
    assert!(log.contains("computer_basics | 题目 4"));
}
