use crate::cliopt::CliOpt;
use crate::common::time::{Period, PeriodSelector};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::input::{Decoder, Reader};
use crate::model::Schema;
use crate::output::encoder::{Encoder, HumanReadableEncoder, JsonEncoder};
use crate::output::Output;
use crate::query::{RecordedSource, Widget, WidgetRequest};

// stdin
//   -> Line (one recorded backend response)
//     -> RecordedResponse { measure, period, result, data }
//       -> StatsSource answering one StatsQuery per measure
//         -> WidgetPayload (series | groups, previous, failed)
//           -> JSON or human readable text
//             -> stdout

pub struct Runner {
    widget: Widget,
    source: RecordedSource,
    request: WidgetRequest,
    period: Period,
    output: Output,
}

impl Runner {
    /// Resolves the period once so the recorded responses and the widget
    /// agree on which window is the current one.
    pub fn new(
        opt: &CliOpt,
        config: &Config,
        reader: &mut dyn Reader,
        decoder: &dyn Decoder,
        output: Output,
    ) -> Result<Self> {
        let schema = Schema::from_file(&opt.schema)?;
        let resolver = config.resolver();
        let period = resolver.resolve(&opt.selector()?, None)?;
        let source = RecordedSource::from_reader(reader, decoder, period)?;

        let mut request = WidgetRequest::new(
            opt.metrics.clone(),
            PeriodSelector::Range {
                start: period.start(),
                end: period.end(),
            },
        );
        request.group_by = opt.group_by.clone();
        request.filter = opt.filter.clone();
        request.limit = opt.limit;
        request.want_display = opt.display;
        request.skip_zero = opt.skip_zero;
        request.compare_previous = opt.previous;

        Ok(Self {
            widget: Widget::new(schema, resolver, config.joiner()),
            source,
            request,
            period,
            output,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        let payload = self
            .widget
            .execute(&self.request, &self.source, Some(&self.period))?;
        self.output.write(&payload)
    }
}

pub fn encoder(encode: Option<&str>, config: &Config) -> Result<Box<dyn Encoder>> {
    match encode {
        None | Some("json") => Ok(Box::new(JsonEncoder::new())),
        Some("h") => Ok(Box::new(HumanReadableEncoder::new(config.joiner()))),
        Some(other) => Err(Error::invalid_argument(&format!(
            "unknown output encoding '{}'",
            other
        ))),
    }
}
