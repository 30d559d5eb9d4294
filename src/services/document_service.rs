// src/services/document_service.rs

use std::path::PathBuf;

use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    models::payslip::{PayComponent, Payslip},
};

/// Tudo que vai impresso no holerite.
#[derive(Debug, Clone)]
pub struct PayslipDocument {
    pub tenant_name: String,
    pub tenant_slug: String,
    pub employee_name: String,
    pub employee_code: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub currency: String,
    pub footer: Option<String>,
    pub payslip: Payslip,
}

impl PayslipDocument {
    /// Texto do QR code. Quem confere o holerite compara com o cadastro.
    pub fn verification_code(&self) -> String {
        format!(
            "PAYSLIP|{}|{}|{:04}-{:02}|{}|{}",
            self.tenant_slug,
            self.employee_code,
            self.payslip.year,
            self.payslip.month,
            self.payslip.net_pay.round_dp(2),
            self.payslip.id
        )
    }

    pub fn file_name(&self) -> String {
        format!("payslip-{}-{:04}-{:02}.pdf", self.employee_code, self.payslip.year, self.payslip.month)
    }
}

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(anyhow::Error::msg(e.to_string()))
}

fn money(currency: &str, value: Decimal) -> String {
    format!("{} {:.2}", currency, value.round_dp(2))
}

#[derive(Clone)]
pub struct DocumentService {
    fonts_dir: PathBuf,
}

impl DocumentService {
    pub fn new(fonts_dir: PathBuf) -> Self {
        Self { fonts_dir }
    }

    /// Renderiza o PDF em memória. Trabalho de CPU: chamar fora do executor async.
    pub fn render_payslip(&self, data: &PayslipDocument) -> Result<Vec<u8>, AppError> {
        // Carrega a fonte da pasta configurada
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, "Roboto", None).map_err(|e| {
            AppError::InternalServerError(anyhow::anyhow!(
                "Fonte Roboto não encontrada em {}: {}",
                self.fonts_dir.display(),
                e
            ))
        })?;

        let payslip = &data.payslip;
        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("Payslip {:02}/{:04} - {}", payslip.month, payslip.year, data.employee_name));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        // --- CABEÇALHO ---
        doc.push(elements::Paragraph::new(data.tenant_name.clone()).styled(style::Style::new().bold().with_font_size(18)));
        doc.push(elements::Break::new(1.5));
        doc.push(
            elements::Paragraph::new(format!("PAYSLIP {:02}/{:04}", payslip.month, payslip.year))
                .styled(style::Style::new().bold().with_font_size(14)),
        );
        doc.push(elements::Paragraph::new(format!("Employee: {} ({})", data.employee_name, data.employee_code)));
        if let Some(department) = &data.department {
            doc.push(elements::Paragraph::new(format!("Department: {}", department)));
        }
        if let Some(designation) = &data.designation {
            doc.push(elements::Paragraph::new(format!("Designation: {}", designation)));
        }
        doc.push(elements::Paragraph::new(format!("Generated: {}", payslip.generated_at.format("%d/%m/%Y"))));
        doc.push(elements::Break::new(2));

        // --- PROVENTOS E DESCONTOS ---
        let style_bold = style::Style::new().bold();
        let mut table = elements::TableLayout::new(vec![4, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        table
            .row()
            .element(elements::Paragraph::new("Description").styled(style_bold))
            .element(elements::Paragraph::new("Amount").styled(style_bold))
            .push()
            .map_err(pdf_error)?;

        let basic = PayComponent { label: "Basic salary".into(), amount: payslip.basic_salary };
        for line in std::iter::once(&basic).chain(payslip.earnings.iter()) {
            table
                .row()
                .element(elements::Paragraph::new(line.label.clone()))
                .element(elements::Paragraph::new(money(&data.currency, line.amount)))
                .push()
                .map_err(pdf_error)?;
        }
        for line in payslip.deductions.iter() {
            table
                .row()
                .element(elements::Paragraph::new(format!("(-) {}", line.label)))
                .element(elements::Paragraph::new(money(&data.currency, line.amount)))
                .push()
                .map_err(pdf_error)?;
        }
        doc.push(table);
        doc.push(elements::Break::new(1.5));

        // --- TOTAIS ---
        for (label, value, size) in [
            ("Gross pay", payslip.gross_pay, 10),
            ("Total deductions", payslip.total_deductions, 10),
            ("NET PAY", payslip.net_pay, 12),
        ] {
            let mut paragraph = elements::Paragraph::new(format!("{}: {}", label, money(&data.currency, value)));
            paragraph.set_alignment(genpdf::Alignment::Right);
            doc.push(paragraph.styled(style::Style::new().bold().with_font_size(size)));
        }
        doc.push(elements::Break::new(2));

        // --- VERIFICAÇÃO (QR CODE) ---
        let verification = data.verification_code();
        let code = QrCode::new(verification.as_bytes()).map_err(pdf_error)?;
        let image_buffer = code.render::<Luma<u8>>().build();
        let pdf_image = elements::Image::from_dynamic_image(image::DynamicImage::ImageLuma8(image_buffer))
            .map_err(pdf_error)?
            .with_scale(genpdf::Scale::new(0.5, 0.5));
        doc.push(pdf_image);
        doc.push(elements::Paragraph::new(verification).styled(style::Style::new().with_font_size(7)));

        // --- RODAPÉ ---
        if let Some(footer) = &data.footer {
            doc.push(elements::Break::new(2));
            doc.push(elements::Paragraph::new(footer.clone()).styled(style::Style::new().italic().with_font_size(8)));
        }

        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn document() -> PayslipDocument {
        PayslipDocument {
            tenant_name: "Acme Bank".into(),
            tenant_slug: "acme-bank".into(),
            employee_name: "Ana Souza".into(),
            employee_code: "EMP-007".into(),
            department: Some("Retail".into()),
            designation: None,
            currency: "USD".into(),
            footer: None,
            payslip: Payslip {
                id: Uuid::nil(),
                tenant_id: Uuid::nil(),
                employee_id: Uuid::nil(),
                month: 3,
                year: 2024,
                basic_salary: Decimal::new(4000_00, 2),
                earnings: Json(vec![]),
                deductions: Json(vec![]),
                gross_pay: Decimal::new(4000_00, 2),
                total_deductions: Decimal::ZERO,
                net_pay: Decimal::new(4000_00, 2),
                generated_by: None,
                generated_at: Utc::now(),
            },
        }
    }

    #[test]
    fn verification_code_identifies_the_payslip() {
        let doc = document();
        assert_eq!(
            doc.verification_code(),
            "PAYSLIP|acme-bank|EMP-007|2024-03|4000.00|00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(doc.file_name(), "payslip-EMP-007-2024-03.pdf");
    }

    #[test]
    fn missing_fonts_are_an_internal_error() {
        let service = DocumentService::new(PathBuf::from("/nonexistent/fonts"));
        let err = service.render_payslip(&document()).unwrap_err();
        assert!(matches!(err, AppError::InternalServerError(_)));
    }
}
