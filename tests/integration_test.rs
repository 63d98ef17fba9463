use ecourts_case_report::utils::logging;
use ecourts_case_report::{
    extract_case_record, layout_report, write_pdf, CaseCtx, CaseFlow, CaseRecord, Config,
};

/// 按真实结果页结构裁剪的 HTML 样例
const RESULT_PAGE: &str = r#"
<div id="secondpage">
  <span class="case_details_table"><label>Case Type</label> : Cr.A(SJ) - CRIMINAL APPEAL (SINGLE JUDGE)</span>
  <span class="case_details_table">
    <label>Filing Number</label> : 2676/2021
    <label>Filing Date</label> : 30-04-2021
  </span>
  <span class="case_details_table">
    <label>Registration Number</label> : 2661/2021
    <label>Registration Date</label> : 05-05-2021
  </span>
  <span class="case_details_table"><label>CNR Number</label> : MPHC020123452021</span>

  <div style="background-color:#FBF6D9;padding:8px">
    <label><strong>First Hearing Date</strong><strong>: 11-05-2021</strong></label>
    <label><strong>Case Status</strong><strong>: Pending</strong></label>
    <label><strong>Coram</strong><strong>: Hon'ble Justice Sharma</strong></label>
  </div>

  <span class="Petitioner_Advocate_table">1) RAMESH KUMAR<br>Advocate - SHRI A. VERMA</span>
  <span class="Respondent_Advocate_table">1) STATE OF MADHYA PRADESH<br>Advocate - GOVT. ADVOCATE</span>

  <table class="Acts_table">
    <tr><th>Under Act(s)</th><th>Under Section(s)</th></tr>
    <tr><td>Indian Penal Code</td><td>302, 34</td></tr>
    <tr><td>Arms Act</td></tr>
  </table>

  <span class="Lower_court_table">
    <span style="display:inline-block;width:150px">Court Number and Name</span><label>: 1, Sessions Court, Bhopal</label>
    <span style="display:inline-block;width:150px">Case Number and Year</span><label>: 45/2019</label>
  </span>

  <table class="order_table">
    <tr><td>Order Number</td><td>Order Date</td><td>Order Details</td></tr>
    <tr><td>1</td><td>11-05-2021</td><td>Notice issued to respondents</td></tr>
    <tr><td>2</td><td>03-08-2021</td><td>Bail application rejected</td></tr>
  </table>
</div>
"#;

/// 完整纯流水线：抽取 → 布局 → PDF（不需要浏览器）
#[test]
fn test_pipeline_from_result_html_to_pdf() {
    let record = extract_case_record(RESULT_PAGE);

    let details = record.get("Case Details").expect("章节必定存在");
    assert_eq!(
        details.get("CNR Number"),
        Some(&CaseRecord::scalar("MPHC020123452021"))
    );
    assert_eq!(
        details.get("Filing Number"),
        Some(&CaseRecord::scalar("2676/2021"))
    );
    assert_eq!(
        details.get("Filing Date"),
        Some(&CaseRecord::scalar("30-04-2021"))
    );

    let status = record.get("Case Status").expect("章节必定存在");
    assert_eq!(status.get("Case Status"), Some(&CaseRecord::scalar("Pending")));

    let CaseRecord::Table(acts) = record.get("Acts").expect("章节必定存在") else {
        panic!("Acts 必须是表格");
    };
    assert_eq!(acts.rows().len(), 1, "缺列的行必须被丢弃");

    let CaseRecord::Table(orders) = record.get("Orders").expect("章节必定存在") else {
        panic!("Orders 必须是表格");
    };
    assert_eq!(orders.rows().len(), 2);

    // 页面里没有 IA 表，章节仍然存在且为空
    let ia = record.get("IA Details").expect("章节必定存在");
    assert!(ia.is_empty());

    let report = layout_report(&record);
    assert!(report.page_count() >= 1);

    let bytes = write_pdf(&report).expect("PDF 序列化失败");
    assert!(bytes.starts_with(b"%PDF"));

    let parsed = lopdf::Document::load_mem(&bytes).expect("输出应能被重新解析");
    assert_eq!(parsed.get_pages().len(), report.page_count());
}

/// 同一份文档抽取两次，结构必须完全一致
#[test]
fn test_extraction_determinism_on_full_page() {
    assert_eq!(extract_case_record(RESULT_PAGE), extract_case_record(RESULT_PAGE));
}

#[tokio::test]
#[ignore] // 默认忽略，需要本机浏览器与网络：cargo test -- --ignored
async fn test_browser_launches() {
    logging::init();

    let config = Config::load();
    let result = ecourts_case_report::browser::launch_headless_browser(&config).await;

    assert!(result.is_ok(), "应该能够启动无头浏览器");
}

#[tokio::test]
#[ignore] // 会访问真实 eCourts 站点并调用本机 tesseract
async fn test_live_case_scrape() {
    logging::init();

    let config = Config::load();
    let flow = CaseFlow::new(&config);

    // 注意：请根据实际情况修改案件参数
    let ctx = CaseCtx::new("Cr.A(SJ)", "2676", "2021");

    let bytes = flow.run(&ctx).await.expect("完整查询流程失败");
    assert!(bytes.starts_with(b"%PDF"));
}
