use hearth_core::WidgetInstance;

/// The mounted runtime object bound to one widget instance.
///
/// Owned exclusively by the lifecycle manager through its live handle and
/// destroyed synchronously on unmount. Implementations render the widget on
/// whatever host surface exists (DOM, terminal, test recorder); the manager
/// treats them as opaque.
pub trait VisualSurface: Send + Sync {
    fn instance_id(&self) -> &str;

    /// Tear the surface down. Called exactly once, immediately before the
    /// handle is dropped.
    fn unmount(&mut self);
}

/// Creates surfaces for instance records whose type has loaded.
pub trait SurfaceFactory: Send + Sync {
    fn mount(&self, instance: &WidgetInstance) -> Box<dyn VisualSurface>;
}

/// Headless surface that just logs lifecycle transitions. Default for the
/// `hearth` binary, where no real rendering host exists.
pub struct LogSurface {
    instance_id: String,
    type_id: String,
}

impl VisualSurface for LogSurface {
    fn instance_id(&self) -> &str {
        &self.instance_id
    }

    fn unmount(&mut self) {
        tracing::info!(
            instance_id = %self.instance_id,
            type_id = %self.type_id,
            "Widget unmounted"
        );
    }
}

#[derive(Default)]
pub struct LogSurfaceFactory;

impl SurfaceFactory for LogSurfaceFactory {
    fn mount(&self, instance: &WidgetInstance) -> Box<dyn VisualSurface> {
        tracing::info!(
            instance_id = %instance.id,
            type_id = %instance.type_id,
            name = %instance.name,
            x = instance.position.x,
            y = instance.position.y,
            "Widget mounted"
        );
        Box::new(LogSurface {
            instance_id: instance.id.clone(),
            type_id: instance.type_id.clone(),
        })
    }
}
