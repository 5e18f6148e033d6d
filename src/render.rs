//! Presentation of a generated exam: plain-text export and the printable HTML sheet.

use html_escape::encode_text;

use crate::domain::{option_letter, ExamConfig, GeneratedExam};

/// Plain-text copy of the question sheet. Keys, explanations, rubrics and ideal answers
/// are always left out, whatever the key toggle says.
pub fn export_plain_text(exam: &GeneratedExam, class_name: Option<&str>) -> String {
  let class_name = class_name.filter(|c| !c.trim().is_empty()).unwrap_or("-");
  let mut text = format!("{}\nKelas: {}\n\nA. PILIHAN GANDA\n", exam.title, class_name);
  for q in &exam.multiple_choice {
    text.push_str(&format!("{}. {}\n", q.number, q.question));
    for (idx, opt) in q.options.iter().enumerate() {
      text.push_str(&format!("   {}. {}\n", option_letter(idx), opt));
    }
    text.push('\n');
  }

  text.push_str("\nB. ESSAI\n");
  for q in &exam.essays {
    text.push_str(&format!("{}. {}\n\n", q.number, q.question));
  }
  text
}

const PRINT_CSS: &str = "body{font-family:'Times New Roman',serif;max-width:21cm;margin:0 auto;padding:2.5cm;color:#000}\
header{text-align:center;border-bottom:2px solid #000;padding-bottom:1.5rem;margin-bottom:2rem}\
header h1{font-size:1.1rem;text-transform:uppercase;margin:0 0 .25rem}\
header h2{font-size:1.4rem;text-transform:uppercase;margin:0 0 .5rem}\
.meta{display:flex;justify-content:space-between;font-size:.9rem}\
section h3{text-transform:uppercase}\
.item{break-inside:avoid;margin-bottom:1.5rem}\
.options{margin-left:2rem}\
.answer-space{margin-left:2rem;border-bottom:1px dotted #999;height:6rem}\
.key{margin:.75rem 0 0 2rem;padding:.75rem;border:1px solid #ccc;font-size:.9rem}\
.signatures{display:flex;justify-content:space-between;margin-top:4rem;padding-top:2rem;border-top:2px solid #000;text-align:center}\
.page-break{break-before:page}";

/// Printable exam sheet. Key blocks appear only when `show_key` is set.
pub fn render_print_html(exam: &GeneratedExam, config: Option<&ExamConfig>, show_key: bool) -> String {
  let class_name = config
    .map(|c| c.class_name.as_str())
    .filter(|c| !c.trim().is_empty())
    .unwrap_or("_________________");

  let mut html = String::new();
  html.push_str(&format!(
    "<!DOCTYPE html>\n<html lang=\"id\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>{css}</style>\n</head>\n<body>\n\
<header>\n<h1>Penilaian Akhir Semester (PAS)</h1>\n<h2>{title}</h2>\n\
<div class=\"meta\"><span>Mata Pelajaran: _________________</span><span>Kelas/Semester: {class}</span><span>Waktu: 90 Menit</span></div>\n</header>\n",
    title = encode_text(&exam.title),
    css = PRINT_CSS,
    class = encode_text(class_name),
  ));

  if !exam.multiple_choice.is_empty() {
    html.push_str("<section class=\"multiple-choice\">\n<h3>A. Pilihan Ganda</h3>\n");
    for q in &exam.multiple_choice {
      html.push_str(&format!(
        "<div class=\"item\">\n<p><strong>{}.</strong> {}</p>\n<div class=\"options\">\n",
        q.number,
        encode_text(&q.question),
      ));
      for (idx, opt) in q.options.iter().enumerate() {
        html.push_str(&format!("<div>{}. {}</div>\n", option_letter(idx), encode_text(opt)));
      }
      html.push_str("</div>\n");
      if show_key {
        html.push_str(&format!(
          "<div class=\"key\">\n<p>Kunci: <strong>{}</strong> · Level: {} · Kesulitan: {}</p>\n<p>Pembahasan: <em>{}</em></p>\n</div>\n",
          encode_text(&q.key),
          encode_text(&q.level),
          q.difficulty,
          encode_text(&q.explanation),
        ));
      }
      html.push_str("</div>\n");
    }
    html.push_str("</section>\n");
  }

  if !exam.essays.is_empty() {
    html.push_str("<section class=\"essays page-break\">\n<h3>B. Soal Uraian (Essai)</h3>\n");
    for q in &exam.essays {
      html.push_str(&format!(
        "<div class=\"item\">\n<p><strong>{}.</strong> {}</p>\n<div class=\"answer-space\"></div>\n",
        q.number,
        encode_text(&q.question),
      ));
      if show_key {
        html.push_str(&format!(
          "<div class=\"key\">\n<p>Jawaban Ideal: {}</p>\n<p>Rubrik/Poin: {}</p>\n<p>{} - {}</p>\n</div>\n",
          encode_text(&q.ideal_answer),
          encode_text(&q.rubric),
          encode_text(&q.level),
          q.difficulty,
        ));
      }
      html.push_str("</div>\n");
    }
    html.push_str("</section>\n");
  }

  html.push_str(
    "<footer class=\"signatures\">\n\
<div><p>Mengetahui,</p><p>Kepala Sekolah</p><br><br><br><p>(__________________)</p><p>NIP.</p></div>\n\
<div><p>Guru Mata Pelajaran</p><br><br><br><p>(__________________)</p><p>NIP.</p></div>\n\
</footer>\n</body>\n</html>\n",
  );
  html
}
