use crate::error::Result;
use crate::models::correction::{CorrectionResult, LetterGrade};
use rust_xlsxwriter::*;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

pub struct ExportService;

impl ExportService {
    /// All results as one JSON document.
    pub fn results_json(results: &[CorrectionResult]) -> Value {
        json!({
            "exported_at": chrono::Utc::now(),
            "total_results": results.len(),
            "results": results,
        })
    }

    /// Styled workbook with a results sheet and a per-question sheet.
    pub fn results_xlsx(
        results: &[CorrectionResult],
        template_names: &HashMap<Uuid, String>,
    ) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();

        let primary_color = Color::RGB(0x1E293B);
        let header_bg = Color::RGB(0x0F172A);
        let alt_row_1 = Color::RGB(0xF8FAFC);
        let alt_row_2 = Color::White;
        let border_color = Color::RGB(0xE2E8F0);
        let pass_color = Color::RGB(0x10B981);
        let fail_color = Color::RGB(0xEF4444);

        let columns = [
            ("#", 6.0),
            ("Student", 24.0),
            ("Template", 30.0),
            ("Version", 10.0),
            ("Correct", 10.0),
            ("Questions", 11.0),
            ("Earned", 10.0),
            ("Total weight", 13.0),
            ("Percentage", 12.0),
            ("Score", 10.0),
            ("Grade", 9.0),
            ("Passed", 10.0),
            ("Corrected at", 20.0),
        ];

        let title_format = Format::new()
            .set_font_size(16)
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);

        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(Color::White)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Results")?;
        for (i, (_, width)) in columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        worksheet.set_row_height(0, 36)?;
        let title = format!(
            "Correction results ({} tests, exported {})",
            results.len(),
            chrono::Utc::now().format("%d.%m.%Y %H:%M UTC")
        );
        worksheet.merge_range(0, 0, 0, (columns.len() - 1) as u16, &title, &title_format)?;

        let header_row = 1;
        worksheet.set_row_height(header_row, 28)?;
        for (i, (name, _)) in columns.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, *name, &header_format)?;
        }

        let data_start_row = 2;
        for (idx, result) in results.iter().enumerate() {
            let row = data_start_row + idx as u32;
            let bg = if idx % 2 == 0 { alt_row_1 } else { alt_row_2 };

            let base_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            let center_fmt = base_fmt.clone().set_align(FormatAlign::Center);
            let number_fmt = center_fmt.clone().set_num_format("0.00");

            worksheet.write_number_with_format(row, 0, (idx + 1) as f64, &center_fmt)?;
            worksheet.write_string_with_format(
                row,
                1,
                &result.student_id,
                &base_fmt.clone().set_bold(),
            )?;
            let template_name = template_names
                .get(&result.template_id)
                .map(String::as_str)
                .unwrap_or("(deleted)");
            worksheet.write_string_with_format(row, 2, template_name, &base_fmt)?;
            worksheet.write_string_with_format(row, 3, &result.template_version, &center_fmt)?;
            let correct = f64::from(result.correct_answers);
            let total = f64::from(result.total_questions);
            worksheet.write_number_with_format(row, 4, correct, &center_fmt)?;
            worksheet.write_number_with_format(row, 5, total, &center_fmt)?;
            worksheet.write_number_with_format(row, 6, result.earned, &number_fmt)?;
            worksheet.write_number_with_format(row, 7, result.total_weight, &number_fmt)?;
            worksheet.write_number_with_format(row, 8, result.percentage, &number_fmt)?;
            worksheet.write_number_with_format(row, 9, result.score, &number_fmt)?;

            let grade_color = match result.letter_grade {
                LetterGrade::A | LetterGrade::B => pass_color,
                LetterGrade::C | LetterGrade::D => Color::RGB(0xF59E0B),
                LetterGrade::F => fail_color,
            };
            let grade_fmt = center_fmt.clone().set_bold().set_font_color(grade_color);
            worksheet.write_string_with_format(
                row,
                10,
                &result.letter_grade.to_string(),
                &grade_fmt,
            )?;

            let passed_fmt = Format::new()
                .set_font_size(10)
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(if result.passed { pass_color } else { fail_color })
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            worksheet.write_string_with_format(
                row,
                11,
                if result.passed { "Yes" } else { "No" },
                &passed_fmt,
            )?;

            let corrected_at = result.corrected_at.format("%d.%m.%Y %H:%M").to_string();
            worksheet.write_string_with_format(row, 12, &corrected_at, &center_fmt)?;
        }

        worksheet.set_freeze_panes(2, 0)?;
        worksheet.autofilter(
            header_row,
            0,
            (data_start_row + results.len() as u32).saturating_sub(1).max(header_row),
            (columns.len() - 1) as u16,
        )?;

        let details = workbook.add_worksheet();
        details.set_name("Questions")?;
        let detail_columns = [
            ("Student", 24.0),
            ("Question", 10.0),
            ("Type", 16.0),
            ("Submitted", 24.0),
            ("Key", 24.0),
            ("Credit", 10.0),
            ("Weight", 10.0),
            ("Correct", 10.0),
        ];
        for (i, (name, width)) in detail_columns.iter().enumerate() {
            details.set_column_width(i as u16, *width)?;
            details.write_string_with_format(0, i as u16, *name, &header_format)?;
        }

        let mut row = 1;
        for result in results {
            for q in &result.questions {
                details.write_string(row, 0, &result.student_id)?;
                details.write_number(row, 1, f64::from(q.number))?;
                details.write_string(row, 2, q.question_type.code())?;
                details.write_string(row, 3, q.submitted.join(", "))?;
                details.write_string(row, 4, q.correct_answers.join(", "))?;
                details.write_number(row, 5, q.credit)?;
                details.write_number(row, 6, q.weight)?;
                details.write_boolean(row, 7, q.is_correct)?;
                row += 1;
            }
        }
        details.set_freeze_panes(1, 0)?;

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::correction::AnswerSheet;
    use crate::models::question::{Question, QuestionType};
    use crate::models::template::Template;
    use crate::services::grading_service::GradingService;
    use tokio_test::assert_ok;

    fn sample_result() -> (CorrectionResult, Uuid) {
        let mut template = Template::new("Export quiz");
        let mut q = Question::new(QuestionType::TrueFalse);
        q.correct_answers = vec!["V".into()];
        template.add_question(q);
        let template_id = Uuid::new_v4();

        let mut answers = AnswerSheet::new();
        answers.insert(1, "V".into());
        let score = GradingService::score_template(&template, &answers);
        (
            CorrectionResult::from_score("student-1".into(), template_id, "A".into(), score),
            template_id,
        )
    }

    #[test]
    fn xlsx_export_is_a_zip_container() {
        let (result, template_id) = sample_result();
        let names = HashMap::from([(template_id, "Export quiz".to_string())]);
        let bytes = assert_ok!(ExportService::results_xlsx(&[result], &names));
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn xlsx_export_handles_no_results() {
        let bytes = assert_ok!(ExportService::results_xlsx(&[], &HashMap::new()));
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn json_export_lists_results() {
        let (result, _) = sample_result();
        let doc = ExportService::results_json(&[result]);
        assert_eq!(doc["total_results"], 1);
        assert_eq!(doc["results"][0]["student_id"], "student-1");
        assert_eq!(doc["results"][0]["letter_grade"], "A");
    }
}
