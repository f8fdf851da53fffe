use crate::models::{Chart, DashboardView};

pub const PAGE_TITLE: &str = "MSU Denver COVID Cases";

pub fn render_dashboard(view: &DashboardView) -> String {
    match view {
        DashboardView::Ready { chart, summary } => render_chart(chart, summary),
        DashboardView::Empty { message } => render_empty(message),
    }
}

pub fn render_chart(chart: &Chart, summary: &str) -> String {
    // serde_json only fails on non-string map keys, which Chart does not have
    let json = serde_json::to_string(chart).unwrap_or_else(|_| "null".to_string());
    INDEX_HTML
        .replace("{{TITLE}}", PAGE_TITLE)
        .replace("{{SUMMARY}}", &escape_html(summary))
        .replace("{{EMPTY_HIDDEN}}", "hidden")
        .replace("{{EMPTY}}", "")
        .replace("{{CHART_JSON}}", &escape_script(&json))
}

pub fn render_empty(message: &str) -> String {
    INDEX_HTML
        .replace("{{TITLE}}", PAGE_TITLE)
        .replace("{{SUMMARY}}", "")
        .replace("{{EMPTY_HIDDEN}}", "")
        .replace("{{EMPTY}}", &escape_html(message))
        .replace("{{CHART_JSON}}", "null")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn escape_script(json: &str) -> String {
    json.replace("</", "<\\/")
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <meta name="google" content="notranslate" />
  <title>{{TITLE}}</title>
  <style>
    :root {
      --bg: #95a5a6;
      --ink: #2c3e50;
      --card: #ffffff;
      --border: #2c3e50;
      --muted: #7b8a8b;
      --shadow: 0 1rem 3rem rgba(0, 0, 0, 0.175);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Lato", "Helvetica Neue", Arial, sans-serif;
      display: flex;
      justify-content: center;
      padding: 40px 18px;
    }

    .card {
      width: min(820px, 100%);
      min-width: 550px;
      align-self: flex-start;
      background: var(--card);
      border: 1px solid var(--border);
      border-radius: 6px;
      box-shadow: var(--shadow);
      overflow: hidden;
    }

    .card-header,
    .card-footer {
      padding: 12px 20px;
      background: rgba(0, 0, 0, 0.03);
    }

    .card-header {
      border-bottom: 1px solid rgba(0, 0, 0, 0.125);
    }

    .card-header h4 {
      margin: 0;
      font-size: 1.4rem;
    }

    .card-body {
      padding: 20px;
    }

    .card-footer {
      border-top: 1px solid rgba(0, 0, 0, 0.125);
      display: flex;
      justify-content: space-between;
      gap: 16px;
      flex-wrap: wrap;
    }

    .card-footer p {
      margin: 0;
    }

    .empty {
      padding: 60px 20px;
      text-align: center;
      color: var(--muted);
    }

    #chart {
      width: 100%;
      height: 380px;
      display: block;
      background: #ebebeb;
    }

    #chart text {
      font-family: inherit;
    }

    .chart-grid {
      stroke: #ffffff;
    }

    .chart-frame {
      stroke: #000000;
      fill: none;
    }

    .chart-label {
      fill: #4d4d4d;
      font-size: 11px;
    }

    .chart-title {
      font-size: 13px;
    }

    .legend {
      display: flex;
      gap: 16px;
      margin: 0 0 8px;
      font-size: 0.9rem;
    }

    .legend span::before {
      content: "";
      display: inline-block;
      width: 12px;
      height: 12px;
      margin-right: 6px;
      vertical-align: -1px;
      background: var(--swatch);
    }
  </style>
</head>
<body>
  <main class="card">
    <div class="card-header">
      <h4>{{TITLE}}</h4>
    </div>
    <div class="card-body">
      <p class="empty" id="empty" {{EMPTY_HIDDEN}}>{{EMPTY}}</p>
      <div class="legend" id="legend"></div>
      <svg id="chart" role="img" aria-label="Case counts by day"></svg>
    </div>
    <div class="card-footer">
      <p id="summary">{{SUMMARY}}</p>
      <p class="source">Counts scraped daily from the public dashboard.</p>
    </div>
  </main>

  <script id="chart-data" type="application/json">{{CHART_JSON}}</script>
  <script>
    const chart = JSON.parse(document.getElementById('chart-data').textContent);
    const chartEl = document.getElementById('chart');
    const legendEl = document.getElementById('legend');

    const formatAxisValue = (value) => {
      if (Math.abs(value) >= 1000) {
        return `${(value / 1000).toFixed(1)}k`;
      }
      return `${Math.round(value)}`;
    };

    const renderChart = (data) => {
      const width = chartEl.clientWidth || 760;
      const height = chartEl.clientHeight || 380;
      const pad = { top: 20, right: 56, bottom: 48, left: 56 };
      const plotW = width - pad.left - pad.right;
      const plotH = height - pad.top - pad.bottom;
      const count = data.dates.length;
      const slot = plotW / Math.max(count, 1);

      const x = (index) => pad.left + slot * (index + 0.5);
      const scale = (axis) => (value) =>
        pad.top + plotH - ((value - axis.min) / (axis.max - axis.min || 1)) * plotH;
      const yFor = {
        left: scale(data.left_axis),
        right: scale(data.right_axis)
      };

      let grid = '';
      const ticks = 4;
      for (let i = 0; i <= ticks; i += 1) {
        const leftValue = data.left_axis.min + ((data.left_axis.max - data.left_axis.min) * i) / ticks;
        const rightValue = data.right_axis.min + ((data.right_axis.max - data.right_axis.min) * i) / ticks;
        const yPos = yFor.left(leftValue);
        grid += `<line class="chart-grid" x1="${pad.left}" y1="${yPos}" x2="${width - pad.right}" y2="${yPos}" />`;
        grid += `<text class="chart-label" x="${pad.left - 8}" y="${yPos + 4}" text-anchor="end">${formatAxisValue(leftValue)}</text>`;
        grid += `<text class="chart-label" x="${width - pad.right + 8}" y="${yPos + 4}">${formatAxisValue(rightValue)}</text>`;
      }

      const labelEvery = Math.max(1, Math.ceil(count / 10));
      const xLabels = data.tick_labels
        .map((label, index) => {
          if (index % labelEvery !== 0) {
            return '';
          }
          return `<text class="chart-label" x="${x(index)}" y="${height - pad.bottom + 18}" text-anchor="middle">${label}</text>`;
        })
        .join('');

      const bars = data.series.filter((s) => s.kind === 'bar');
      const barWidth = (slot * 0.8) / Math.max(bars.length, 1);
      const barShapes = bars
        .map((s, barIndex) => {
          const y = yFor[s.axis];
          const zero = y(Math.max(0, data[`${s.axis}_axis`].min));
          return s.points
            .map((value, index) => {
              if (value === null) {
                return '';
              }
              const left = x(index) - slot * 0.4 + barWidth * barIndex;
              const top = Math.min(y(value), zero);
              const h = Math.abs(zero - y(value));
              return `<rect x="${left}" y="${top}" width="${barWidth}" height="${h}" fill="${s.color}"><title>${s.name}: ${value}</title></rect>`;
            })
            .join('');
        })
        .join('');

      const lines = data.series
        .filter((s) => s.kind === 'line')
        .map((s) => {
          const y = yFor[s.axis];
          let path = '';
          let pen = 'M';
          s.points.forEach((value, index) => {
            if (value === null) {
              pen = 'M';
              return;
            }
            path += `${pen} ${x(index).toFixed(2)} ${y(value).toFixed(2)} `;
            pen = 'L';
          });
          return `<path d="${path}" fill="none" stroke="${s.color}" stroke-width="2.5"><title>${s.name}</title></path>`;
        })
        .join('');

      const frame = `<rect class="chart-frame" x="${pad.left}" y="${pad.top}" width="${plotW}" height="${plotH}" />`;
      const titles = `
        <text class="chart-label chart-title" transform="translate(14 ${pad.top + plotH / 2}) rotate(-90)" text-anchor="middle" style="fill:${data.left_axis.color}">${data.left_axis.title}</text>
        <text class="chart-label chart-title" transform="translate(${width - 10} ${pad.top + plotH / 2}) rotate(90)" text-anchor="middle" style="fill:${data.right_axis.color}">${data.right_axis.title}</text>
        <text class="chart-label chart-title" x="${pad.left + plotW / 2}" y="${height - 8}" text-anchor="middle">Date</text>`;

      chartEl.setAttribute('viewBox', `0 0 ${width} ${height}`);
      chartEl.innerHTML = `${grid}${barShapes}${lines}${frame}${xLabels}${titles}`;

      legendEl.innerHTML = data.series
        .filter((s) => s.show_legend)
        .map((s) => `<span style="--swatch:${s.color}">${s.name}</span>`)
        .join('');
    };

    if (chart) {
      renderChart(chart);
    } else {
      chartEl.style.display = 'none';
    }
  </script>
</body>
</html>
"#;
